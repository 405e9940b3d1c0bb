use std::env;
use std::fmt;
use std::str::FromStr;

use secrecy::Secret;

use crate::query::{PaginationSettings, QuerySettings};

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "{key} has invalid value '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: Secret<String>,
    pub bind_address: String,
    pub port: u16,
    /// Comma separated list of allowed origins
    pub cors_allowed_origins: String,
    pub db_max_connections: u32,
    pub query: QuerySettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let optional = |key: &'static str, default: &str| {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let default_page_size: i64 = parse(&lookup, "DEFAULT_PAGE_SIZE", 10)?;
        let max_page_size: i64 = parse(&lookup, "MAX_PAGE_SIZE", 100)?;
        if default_page_size < 1 {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_PAGE_SIZE",
                value: default_page_size.to_string(),
            });
        }
        if max_page_size < default_page_size {
            return Err(ConfigError::Invalid {
                key: "MAX_PAGE_SIZE",
                value: max_page_size.to_string(),
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: Secret::new(required("JWT_SECRET")?),
            bind_address: optional("BIND_ADDRESS", "0.0.0.0"),
            port: parse(&lookup, "PORT", 8080)?,
            cors_allowed_origins: optional("CORS_ALLOWED_ORIGINS", "http://localhost:3000"),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            query: QuerySettings {
                pagination: PaginationSettings {
                    default_page_size,
                    max_page_size,
                },
                max_filter_depth: parse(&lookup, "MAX_FILTER_DEPTH", 4)?,
            },
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/db"), ("JWT_SECRET", "s")])
            .expect("config should load");
        assert_eq!(cfg.jwt_secret.expose_secret(), "s");
        assert_eq!(cfg.bind_address, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_max_connections, 20);
        assert_eq!(cfg.query, QuerySettings::default());
    }

    #[test]
    fn test_missing_required() {
        assert_eq!(
            config(&[("JWT_SECRET", "s")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = config(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_page_size_bounds() {
        let err = config(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s"),
            ("DEFAULT_PAGE_SIZE", "50"),
            ("MAX_PAGE_SIZE", "20"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MAX_PAGE_SIZE", .. }));
    }
}
