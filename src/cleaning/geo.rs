// src/cleaning/geo.rs - Country / state standardization against warehouse reference tables
use anyhow::{Context, Result};
use deunicode::deunicode;
use std::collections::{HashMap, HashSet};

use super::lookup_tables::{fix_country, fix_state};
use crate::models::table::{ColumnType, Table, Value};
use crate::utils::config::LinkageConfig;
use crate::utils::progress_bars::logging::{LinkageLogger, LinkageStage};
use crate::utils::warehouse::QueryExecutor;

/// Lowercased, trimmed key to canonical name, plus the set of canonical names.
#[derive(Debug, Clone, Default)]
struct GeoMapping {
    keys: HashMap<String, String>,
    valid: HashSet<String>,
}

impl GeoMapping {
    /// `sources` are `(key, canonical)` lists applied in order; later lists win on collision.
    fn build(canonical: &[Option<String>], sources: &[Vec<Option<String>>]) -> Self {
        let valid: HashSet<String> = canonical.iter().flatten().cloned().collect();
        let mut keys = HashMap::new();
        for source in sources {
            for (key, name) in source.iter().zip(canonical) {
                if let (Some(key), Some(name)) = (key, name) {
                    keys.insert(key.trim().to_lowercase(), name.clone());
                }
            }
        }
        Self { keys, valid }
    }

    fn clean(&self, raw: &str) -> String {
        self.keys
            .get(&raw.trim().to_lowercase())
            .cloned()
            .unwrap_or_else(|| raw.trim().to_string())
    }

    fn flag(&self, value: Option<&str>) -> Value {
        Value::Int(i64::from(value.is_some_and(|v| self.valid.contains(v))))
    }

    /// Adds `{column}Clean`, `{column}Valid` and `{column}CleanValid`.
    fn apply(&self, table: &mut Table, column: &str, logger: &LinkageLogger) {
        let Some(values) = table.column_values(column) else {
            logger.log_warning(&format!("Column '{}' not found, skipping standardization", column));
            return;
        };

        let mut cleaned = Vec::with_capacity(values.len());
        let mut valid = Vec::with_capacity(values.len());
        let mut clean_valid = Vec::with_capacity(values.len());
        for value in values {
            let raw = match value {
                Value::Null => None,
                other => Some(other.to_string()),
            };
            let clean = raw.as_deref().map(|r| self.clean(r));
            valid.push(self.flag(raw.as_deref()));
            clean_valid.push(self.flag(clean.as_deref()));
            cleaned.push(clean.map_or(Value::Null, Value::Text));
        }

        let unresolved = clean_valid
            .iter()
            .zip(&cleaned)
            .filter(|(flag, clean)| **flag == Value::Int(0) && !clean.is_null())
            .count();
        logger.log_data_quality_issue(&format!("unrecognized values in '{}'", column), unresolved);

        table.set_column(&format!("{}Clean", column), ColumnType::Text, cleaned);
        table.set_column(&format!("{}Valid", column), ColumnType::Int, valid);
        table.set_column(&format!("{}CleanValid", column), ColumnType::Int, clean_valid);
    }
}

fn text_column(table: &Table, name: &str) -> Vec<Option<String>> {
    table
        .column_values(name)
        .map(|values| {
            values
                .into_iter()
                .map(|v| if v.is_null() { None } else { Some(v.to_string()) })
                .collect()
        })
        .unwrap_or_else(|| vec![None; table.len()])
}

fn transliterate(names: &[Option<String>]) -> Vec<Option<String>> {
    names.iter().map(|n| n.as_deref().map(deunicode)).collect()
}

/// Maps free-text countries and states to canonical reference names.
#[derive(Debug, Clone)]
pub struct GeoStandardizer {
    countries: GeoMapping,
    states: GeoMapping,
}

impl GeoStandardizer {
    /// Fetch both reference tables and build the mappings once.
    pub async fn load<E: QueryExecutor>(client: &E, config: &LinkageConfig) -> Result<Self> {
        let logger = LinkageLogger::new(LinkageStage::Geography);
        logger.log_start("reference tables");

        let country_query = format!(
            r#"SELECT id AS "Id", name AS "Name", iso3 AS "ISO3", iso2 AS "ISO2", native AS "Native" FROM {}"#,
            config.reference_table("geo_country")
        );
        let state_query = format!(
            r#"SELECT id AS "Id", name AS "Name", country_code AS "CountryISO2", state_code AS "Code" FROM {}"#,
            config.reference_table("geo_states")
        );
        let (countries, states) = tokio::try_join!(
            client.execute_query(&country_query),
            client.execute_query(&state_query)
        )
        .context("Failed to fetch geography reference tables")?;

        logger.log_data_loaded(countries.len(), "country");
        logger.log_data_loaded(states.len(), "state");
        Self::from_reference(&countries, &states)
    }

    /// Build from already-fetched reference tables (`Name` column required in both).
    pub fn from_reference(countries: &Table, states: &Table) -> Result<Self> {
        for (table, label) in [(countries, "country"), (states, "state")] {
            if !table.has_column("Name") {
                anyhow::bail!("{} reference table has no 'Name' column", label);
            }
        }

        let country_names = text_column(countries, "Name");
        let canonical_countries: Vec<Option<String>> = country_names
            .iter()
            .map(|n| n.as_deref().map(fix_country))
            .collect();
        let countries = GeoMapping::build(
            &canonical_countries,
            &[
                text_column(countries, "Native"),
                canonical_countries.clone(),
                country_names.clone(),
                transliterate(&country_names),
                text_column(countries, "ISO3"),
                text_column(countries, "ISO2"),
            ],
        );

        let state_names = text_column(states, "Name");
        let canonical_states: Vec<Option<String>> = state_names
            .iter()
            .map(|n| n.as_deref().map(fix_state))
            .collect();
        let states = GeoMapping::build(
            &canonical_states,
            &[
                canonical_states.clone(),
                transliterate(&state_names),
                state_names.clone(),
                text_column(states, "Code"),
            ],
        );

        Ok(Self { countries, states })
    }

    pub fn standardize_country(&self, table: &mut Table, column: &str) {
        let logger = LinkageLogger::new(LinkageStage::Geography);
        logger.log_phase("Standardizing country", Some(column));
        self.countries.apply(table, column, &logger);
    }

    pub fn standardize_state(&self, table: &mut Table, column: &str) {
        let logger = LinkageLogger::new(LinkageStage::Geography);
        logger.log_phase("Standardizing state", Some(column));
        self.states.apply(table, column, &logger);
    }

    pub fn canonical_country(&self, raw: &str) -> String {
        self.countries.clean(raw)
    }

    pub fn canonical_state(&self, raw: &str) -> String {
        self.states.clean(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::warehouse::fixtures::FixtureWarehouse;

    fn country_reference() -> Table {
        Table::from_rows(
            &[
                ("Id", ColumnType::Int),
                ("Name", ColumnType::Text),
                ("ISO3", ColumnType::Text),
                ("ISO2", ColumnType::Text),
                ("Native", ColumnType::Text),
            ],
            vec![
                vec![Value::Int(1), "Czech Republic".into(), "CZE".into(), "CZ".into(), "Česko".into()],
                vec![Value::Int(2), "Germany".into(), "DEU".into(), "DE".into(), "Deutschland".into()],
                vec![Value::Int(3), "Curaçao".into(), "CUW".into(), "CW".into(), Value::Null],
                vec![Value::Int(4), "United States".into(), "USA".into(), "US".into(), "United States".into()],
            ],
        )
    }

    fn state_reference() -> Table {
        Table::from_rows(
            &[("Id", ColumnType::Int), ("Name", ColumnType::Text), ("Code", ColumnType::Text)],
            vec![
                vec![Value::Int(1), "Bavaria".into(), "BY".into()],
                vec![Value::Int(2), "Massachusetts".into(), "MA".into()],
                vec![Value::Int(3), "Île-de-France".into(), "IDF".into()],
            ],
        )
    }

    fn standardizer() -> GeoStandardizer {
        GeoStandardizer::from_reference(&country_reference(), &state_reference()).unwrap()
    }

    #[test]
    fn test_country_keys_resolve_to_canonical_name() {
        let geo = standardizer();
        assert_eq!(geo.canonical_country("Czech Republic"), "Czechia");
        assert_eq!(geo.canonical_country(" cz "), "Czechia");
        assert_eq!(geo.canonical_country("DEU"), "Germany");
        assert_eq!(geo.canonical_country("deutschland"), "Germany");
        assert_eq!(geo.canonical_country("Curacao"), "Curaçao");
        assert_eq!(geo.canonical_country("us"), "United States of America");
        assert_eq!(geo.canonical_country("  Narnia "), "Narnia");
    }

    #[test]
    fn test_canonical_country_maps_to_itself() {
        let geo = standardizer();
        for name in ["Czechia", "Germany", "Curaçao", "United States of America"] {
            assert_eq!(geo.canonical_country(name), name);
        }
    }

    #[test]
    fn test_state_keys_resolve_to_canonical_name() {
        let geo = standardizer();
        assert_eq!(geo.canonical_state("Bavaria"), "Bayern");
        assert_eq!(geo.canonical_state("by"), "Bayern");
        assert_eq!(geo.canonical_state("ile-de-france"), "Île-de-France");
        assert_eq!(geo.canonical_state("MA"), "Massachusetts");
    }

    #[test]
    fn test_standardize_country_adds_flag_columns() {
        let geo = standardizer();
        let mut table = Table::from_rows(
            &[("BillingCountry", ColumnType::Text)],
            vec![
                vec!["Germany".into()],
                vec!["czech republic".into()],
                vec![Value::Null],
                vec!["Atlantis ".into()],
            ],
        );
        geo.standardize_country(&mut table, "BillingCountry");

        let clean = table.column_values("BillingCountryClean").unwrap();
        assert_eq!(
            clean,
            vec![&Value::text("Germany"), &Value::text("Czechia"), &Value::Null, &Value::text("Atlantis")]
        );
        let valid = table.column_values("BillingCountryValid").unwrap();
        assert_eq!(valid, vec![&Value::Int(1), &Value::Int(0), &Value::Int(0), &Value::Int(0)]);
        let clean_valid = table.column_values("BillingCountryCleanValid").unwrap();
        assert_eq!(clean_valid, vec![&Value::Int(1), &Value::Int(1), &Value::Int(0), &Value::Int(0)]);
        assert_eq!(table.column_type("BillingCountryValid"), Some(ColumnType::Int));
    }

    #[test]
    fn test_missing_column_leaves_table_unchanged() {
        let geo = standardizer();
        let mut table = Table::from_rows(&[("City", ColumnType::Text)], vec![vec!["Boston".into()]]);
        let before = table.clone();
        geo.standardize_state(&mut table, "BillingState");
        assert_eq!(table, before);
    }

    #[test]
    fn test_reference_without_name_is_rejected() {
        let bad = Table::from_rows(&[("Code", ColumnType::Text)], vec![]);
        assert!(GeoStandardizer::from_reference(&bad, &state_reference()).is_err());
    }

    #[tokio::test]
    async fn test_load_fetches_reference_tables() {
        let warehouse = FixtureWarehouse::new()
            .with_table("maintenance.geo_country", country_reference())
            .with_table("maintenance.geo_states", state_reference());
        let geo = GeoStandardizer::load(&warehouse, &LinkageConfig::default())
            .await
            .unwrap();
        assert_eq!(warehouse.query_count(), 2);
        assert_eq!(geo.canonical_state("Bavaria"), "Bayern");
    }
}
