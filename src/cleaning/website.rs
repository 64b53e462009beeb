// src/cleaning/website.rs - Website / domain normalization for account records
use url::Url;

use crate::models::table::Value;

/// Normalized forms of a raw website string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanWebsite {
    /// Host without `www.` plus any non-root path, lowercase, no trailing slash.
    pub website: String,
    /// Host without `www.`.
    pub domain: String,
}

fn is_ip_address(host: &str) -> bool {
    host.contains(':')
        || (host.split('.').count() == 4 && host.split('.').all(|part| part.parse::<u8>().is_ok()))
}

pub fn clean_website_domain(raw: &str) -> Option<CleanWebsite> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with("mailto:") || trimmed.starts_with("tel:") {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    let parsed = Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if domain.is_empty() || !domain.contains('.') || is_ip_address(&domain) {
        return None;
    }

    let path = parsed.path().trim_end_matches('/').to_lowercase();
    let website = if path.is_empty() {
        domain.clone()
    } else {
        format!("{}{}", domain, path)
    };
    Some(CleanWebsite { website, domain })
}

/// `(WebsiteClean, DomainClean)` columns for a column of raw websites.
pub fn clean_website_column(values: &[&Value]) -> (Vec<Value>, Vec<Value>) {
    values
        .iter()
        .map(|value| {
            match value.as_str().and_then(clean_website_domain) {
                Some(clean) => (Value::Text(clean.website), Value::Text(clean.domain)),
                None => (Value::Null, Value::Null),
            }
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_website_domain() {
        let clean = clean_website_domain("https://www.Acme.com/").unwrap();
        assert_eq!(clean.website, "acme.com");
        assert_eq!(clean.domain, "acme.com");

        let clean = clean_website_domain("acme.co.uk/en/Products/").unwrap();
        assert_eq!(clean.website, "acme.co.uk/en/products");
        assert_eq!(clean.domain, "acme.co.uk");
    }

    #[test]
    fn test_rejects_unusable_websites() {
        assert!(clean_website_domain("").is_none());
        assert!(clean_website_domain("mailto:sales@acme.com").is_none());
        assert!(clean_website_domain("localhost").is_none());
        assert!(clean_website_domain("http://10.0.0.1/admin").is_none());
    }

    #[test]
    fn test_clean_website_column_keeps_row_alignment() {
        let raw = vec![Value::text("www.globex.com"), Value::Null, Value::text("n/a")];
        let refs: Vec<&Value> = raw.iter().collect();
        let (websites, domains) = clean_website_column(&refs);
        assert_eq!(websites, vec![Value::text("globex.com"), Value::Null, Value::Null]);
        assert_eq!(domains.len(), 3);
        assert_eq!(domains[0], Value::text("globex.com"));
    }
}
