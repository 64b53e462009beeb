// src/utils/env.rs
use log::{debug, info};
use std::env;
use std::str::FromStr;

/// Loads variables from a `.env` file if one is present. System variables win.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded ({}); using system environment", e),
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub fn env_string_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_parses_and_falls_back() {
        env::set_var("LINKAGE_TEST_ENV_OR", "12");
        assert_eq!(env_or("LINKAGE_TEST_ENV_OR", 3usize), 12);
        env::set_var("LINKAGE_TEST_ENV_OR", "twelve");
        assert_eq!(env_or("LINKAGE_TEST_ENV_OR", 3usize), 3);
        env::remove_var("LINKAGE_TEST_ENV_OR");
        assert_eq!(env_or("LINKAGE_TEST_ENV_OR", 0.5f64), 0.5);
    }

    #[test]
    fn test_env_string_or_ignores_blank() {
        env::set_var("LINKAGE_TEST_ENV_STRING", "   ");
        assert_eq!(env_string_or("LINKAGE_TEST_ENV_STRING", "fallback"), "fallback");
        env::remove_var("LINKAGE_TEST_ENV_STRING");
    }
}
