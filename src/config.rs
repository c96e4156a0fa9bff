//! Application configuration loaded from the environment.
//!
//! A `.env` file in the working directory is read first when present.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `DATABASE_URL` | `bank.db` | SQLite file path, `sqlite://path`, or `:memory:` |
//! | `APP_HOST` | `0.0.0.0` | HTTP bind host |
//! | `PORT` | `8080` | HTTP bind port |
//! | `BANK_ALLOW_OVERDRAFT` | `false` | Permit negative balances |

use crate::service::OverdraftPolicy;
use std::env;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "bank.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub app_host: String,
    pub app_port: u16,
    pub allow_overdraft: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            app_host: DEFAULT_HOST.to_string(),
            app_port: DEFAULT_PORT,
            allow_overdraft: false,
        }
    }
}

impl AppConfig {
    /// Load from process environment (after `.env`, if any).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is fine
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.database_url);
        let app_host = lookup("APP_HOST").unwrap_or(defaults.app_host);

        let app_port = match lookup("PORT") {
            Some(value) => value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "PORT".to_string(),
                    message: e.to_string(),
                }
            })?,
            None => defaults.app_port,
        };

        let allow_overdraft = match lookup("BANK_ALLOW_OVERDRAFT") {
            Some(value) => parse_flag("BANK_ALLOW_OVERDRAFT", &value)?,
            None => defaults.allow_overdraft,
        };

        Ok(AppConfig {
            database_url,
            app_host,
            app_port,
            allow_overdraft,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn overdraft_policy(&self) -> OverdraftPolicy {
        OverdraftPolicy::from_allow_flag(self.allow_overdraft)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.overdraft_policy(), OverdraftPolicy::Forbid);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite:///tmp/bank.db"),
            ("APP_HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("BANK_ALLOW_OVERDRAFT", "true"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite:///tmp/bank.db");
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.overdraft_policy(), OverdraftPolicy::Allow);
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
        assert!(err.to_string().starts_with("Invalid value for PORT"));
    }

    #[rstest]
    #[case("yes", true)]
    #[case("ON", true)]
    #[case("0", false)]
    #[case("false", false)]
    fn test_overdraft_flag(#[case] value: &str, #[case] expected: bool) {
        let config =
            AppConfig::from_lookup(lookup_from(&[("BANK_ALLOW_OVERDRAFT", value)])).unwrap();

        assert_eq!(config.allow_overdraft, expected);
    }

    #[test]
    fn test_invalid_overdraft_flag() {
        let result = AppConfig::from_lookup(lookup_from(&[("BANK_ALLOW_OVERDRAFT", "maybe")]));

        assert!(result.is_err());
    }
}
