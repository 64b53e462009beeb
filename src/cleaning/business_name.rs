// src/cleaning/business_name.rs - Business name normalization with warehouse-sourced stopword and country lists
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tokio::sync::OnceCell;

use crate::models::table::Value;
use crate::utils::config::LinkageConfig;
use crate::utils::progress_bars::logging::{LinkageLogger, LinkageStage};
use crate::utils::warehouse::QueryExecutor;

/// Legal-entity designators stripped from the end of a name, compared lowercase with dots removed.
const CORPORATE_SUFFIXES: &[&str] = &[
    "inc", "incorporated", "corp", "corporation", "llc", "ltd", "limited", "co", "company",
    "plc", "gmbh", "ag", "kg", "kgaa", "sa", "sarl", "sas", "bv", "nv", "pty", "pte", "srl",
    "spa", "lp", "llp", "lllp", "pllc", "pc", "oy", "ab", "as", "asa", "aps", "sl", "sro",
    "kk", "bhd", "sdn", "ulc", "lc", "ltda",
];

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\([^()]*\)|\[[^\[\]]*\]|\([^()]*$|\[[^\[\]]*$").expect("valid regex")
});
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,-]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

fn suffix_key(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .replace('.', "")
        .to_lowercase()
}

/// Removes trailing corporate designators ("Inc.", "Pty Ltd", "GmbH") and titleizes what is left.
pub fn clean_business_name(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    while tokens.len() > 1 {
        let key = suffix_key(tokens[tokens.len() - 1]);
        if CORPORATE_SUFFIXES.contains(&key.as_str()) {
            tokens.pop();
        } else {
            break;
        }
    }
    let joined = tokens.join(" ");
    let trimmed = joined.trim_end_matches(|c: char| matches!(c, ',' | '&' | ';' | ':' | '-' | '/'));
    titleize(trimmed.trim())
}

/// Uppercase the first letter of each alphabetic run and lowercase the rest.
pub fn titleize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Drop bracketed content (including an unterminated trailing bracket), split on `,`/`-`, collapse spaces.
pub fn apply_regex_patterns(text: &str) -> String {
    let text = PARENTHETICAL.replace_all(text, " ");
    let text = SEPARATORS.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Case-insensitive, word-bounded alternation over literal terms. `None` when there are no terms.
pub fn build_term_pattern<S: AsRef<str>>(terms: &[S]) -> Result<Option<Regex>> {
    let mut escaped: Vec<String> = terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }
    // Longer alternatives first so "United States of America" wins over "United States".
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    escaped.dedup();
    let pattern = format!(r"\b(?:{})\b", escaped.join("|"));
    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .size_limit(64 * (1 << 20))
        .build()
        .context("Failed to compile term pattern")?;
    Ok(Some(regex))
}

fn remove_terms(text: &str, pattern: Option<&Regex>) -> String {
    match pattern {
        Some(re) => {
            let removed = re.replace_all(text, "");
            WHITESPACE.replace_all(removed.trim(), " ").to_string()
        }
        None => text.trim().to_string(),
    }
}

/// Full cleaning chain for one name given the compiled stopword and country patterns.
pub fn clean_text(text: &str, stopwords: Option<&Regex>, countries: Option<&Regex>) -> String {
    let text = clean_business_name(text);
    let text = apply_regex_patterns(&text);
    let text = remove_terms(&text, stopwords);
    remove_terms(&text, countries)
}

/// Cleans business names. Stopword and country lists are fetched from the
/// reference schema on first use and kept for the lifetime of the cleaner.
pub struct BusinessNameCleaner<'a, E: QueryExecutor> {
    client: &'a E,
    stopwords_relation: String,
    countries_relation: String,
    stopwords_pattern: OnceCell<Option<Regex>>,
    country_pattern: OnceCell<Option<Regex>>,
}

impl<'a, E: QueryExecutor> BusinessNameCleaner<'a, E> {
    pub fn new(client: &'a E, config: &LinkageConfig) -> Self {
        Self {
            client,
            stopwords_relation: config.reference_table("stopwords"),
            countries_relation: config.reference_table("countries"),
            stopwords_pattern: OnceCell::new(),
            country_pattern: OnceCell::new(),
        }
    }

    async fn fetch_terms(&self, relation: &str) -> Result<Vec<String>> {
        let query = format!("SELECT term FROM {}", relation);
        let table = self
            .client
            .execute_query(&query)
            .await
            .with_context(|| format!("Failed to fetch terms from {}", relation))?;
        let terms = table
            .rows()
            .iter()
            .filter_map(|row| row.first().and_then(Value::as_str).map(str::to_string))
            .collect();
        Ok(terms)
    }

    async fn stopwords(&self) -> Result<Option<&Regex>> {
        let pattern = self
            .stopwords_pattern
            .get_or_try_init(|| async {
                let terms = self.fetch_terms(&self.stopwords_relation).await?;
                build_term_pattern(&terms)
            })
            .await?;
        Ok(pattern.as_ref())
    }

    async fn countries(&self) -> Result<Option<&Regex>> {
        let pattern = self
            .country_pattern
            .get_or_try_init(|| async {
                let terms = self.fetch_terms(&self.countries_relation).await?;
                build_term_pattern(&terms)
            })
            .await?;
        Ok(pattern.as_ref())
    }

    /// Clean a column of names. Nulls pass through unchanged.
    pub async fn clean_names(&self, names: &[&Value]) -> Result<Vec<Value>> {
        let logger = LinkageLogger::new(LinkageStage::NameCleaning);
        let stopwords = self.stopwords().await?;
        let countries = self.countries().await?;

        let mut emptied = 0usize;
        let cleaned = names
            .iter()
            .map(|value| match value {
                Value::Null => Value::Null,
                other => {
                    let raw = other.to_string();
                    let cleaned = clean_text(&raw, stopwords, countries);
                    if cleaned.is_empty() && !raw.trim().is_empty() {
                        emptied += 1;
                    }
                    Value::Text(cleaned)
                }
            })
            .collect();
        logger.log_data_quality_issue("names cleaned down to an empty string", emptied);
        logger.log_debug(&format!("Cleaned {} names", names.len()));
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::{ColumnType, Table};
    use crate::utils::warehouse::fixtures::FixtureWarehouse;

    fn term_table(terms: &[&str]) -> Table {
        Table::from_rows(
            &[("term", ColumnType::Text)],
            terms.iter().map(|t| vec![Value::text(*t)]).collect(),
        )
    }

    #[test]
    fn test_clean_business_name_strips_suffixes() {
        assert_eq!(clean_business_name("ACME INC."), "Acme");
        assert_eq!(clean_business_name("Acme Inc"), "Acme");
        assert_eq!(clean_business_name("Widget Pty Ltd"), "Widget");
        assert_eq!(clean_business_name("Smith & Co."), "Smith");
        assert_eq!(clean_business_name("Company"), "Company");
        assert_eq!(clean_business_name("Cobalt Systems"), "Cobalt Systems");
    }

    #[test]
    fn test_titleize_matches_word_starts() {
        assert_eq!(titleize("hello WORLD"), "Hello World");
        assert_eq!(titleize("o'neil 3m"), "O'Neil 3M");
    }

    #[test]
    fn test_apply_regex_patterns() {
        assert_eq!(apply_regex_patterns("Acme (Europe) Holdings"), "Acme Holdings");
        assert_eq!(apply_regex_patterns("Acme [old] - North, East"), "Acme North East");
        assert_eq!(apply_regex_patterns("Acme (unterminated"), "Acme");
    }

    #[test]
    fn test_clean_text_removes_stopwords_and_countries() {
        let stopwords = build_term_pattern(&["holdings", "group"]).unwrap();
        let countries = build_term_pattern(&["Germany", "United States", "United States of America"])
            .unwrap();
        assert_eq!(
            clean_text("ACME Holdings (Europe) Ltd.", stopwords.as_ref(), countries.as_ref()),
            "Acme"
        );
        assert_eq!(
            clean_text("Globex Group United States of America", stopwords.as_ref(), countries.as_ref()),
            "Globex"
        );
        // word boundaries: "Groupon" keeps its stem
        assert_eq!(clean_text("Groupon", stopwords.as_ref(), countries.as_ref()), "Groupon");
    }

    #[test]
    fn test_empty_term_list_builds_no_pattern() {
        let empty: [&str; 0] = [];
        assert!(build_term_pattern(&empty).unwrap().is_none());
        assert!(build_term_pattern(&["  "]).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleaner_fetches_terms_once() {
        let warehouse = FixtureWarehouse::new()
            .with_table("maintenance.stopwords", term_table(&["the"]))
            .with_table("maintenance.countries", term_table(&["France"]));
        let cleaner = BusinessNameCleaner::new(&warehouse, &LinkageConfig::default());

        let first = vec![Value::text("The Widget Company France"), Value::Null];
        let refs: Vec<&Value> = first.iter().collect();
        let cleaned = cleaner.clean_names(&refs).await.unwrap();
        assert_eq!(cleaned, vec![Value::text("Widget Company"), Value::Null]);

        let second = vec![Value::text("Foo (Paris) SARL")];
        let refs: Vec<&Value> = second.iter().collect();
        let cleaned = cleaner.clean_names(&refs).await.unwrap();
        assert_eq!(cleaned, vec![Value::text("Foo")]);

        assert_eq!(warehouse.query_count(), 2);
    }

    #[tokio::test]
    async fn test_cleaner_propagates_query_failure() {
        let warehouse = FixtureWarehouse::new();
        let cleaner = BusinessNameCleaner::new(&warehouse, &LinkageConfig::default());
        let names = vec![Value::text("Acme")];
        let refs: Vec<&Value> = names.iter().collect();
        assert!(cleaner.clean_names(&refs).await.is_err());
    }
}
