//! API runtime configuration.
//!
//! Resolved once at process startup and passed into [`crate::app::build_app`];
//! handlers never read environment variables.

use std::net::SocketAddr;

use saude_observability::LogFormat;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Upper bound for the `size` query parameter of list endpoints.
    pub max_page_size: usize,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            log_format: LogFormat::Json,
        }
    }
}

impl ApiConfig {
    /// Read `SAUDE_BIND_ADDR`, `SAUDE_MAX_PAGE_SIZE` and `SAUDE_LOG_FORMAT`,
    /// loading a `.env` file first when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ApiConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("SAUDE_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "SAUDE_BIND_ADDR",
                reason: e.to_string(),
            })?;

        let max_page_size = match lookup("SAUDE_MAX_PAGE_SIZE") {
            None => DEFAULT_MAX_PAGE_SIZE,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "SAUDE_MAX_PAGE_SIZE",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "SAUDE_MAX_PAGE_SIZE",
                        reason: e.to_string(),
                    });
                }
            },
        };

        let log_format = match lookup("SAUDE_LOG_FORMAT") {
            None => LogFormat::Json,
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                var: "SAUDE_LOG_FORMAT",
                reason,
            })?,
        };

        Ok(Self {
            bind_addr,
            max_page_size,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ApiConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("SAUDE_BIND_ADDR", "127.0.0.1:9000"),
            ("SAUDE_MAX_PAGE_SIZE", "50"),
            ("SAUDE_LOG_FORMAT", "pretty"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.max_page_size, 50);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[("SAUDE_MAX_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SAUDE_MAX_PAGE_SIZE", .. }));
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[("SAUDE_BIND_ADDR", "localhost")])).unwrap_err();
        assert!(err.to_string().starts_with("invalid SAUDE_BIND_ADDR"));
    }
}
