//! Process configuration from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `PHARMABILL_DATABASE_URL` | `sqlite://pharmabill.db` | SQLite URL, or `memory` for a throwaway in-memory store |
//! | `PHARMABILL_LOW_STOCK_THRESHOLD` | `10` | Items with stock below this count as low stock |
//! | `PHARMABILL_ISSUER_FILE` | unset | JSON file with the issuer profile printed on invoices |

use std::path::PathBuf;

use thiserror::Error;

use pharmabill_catalog::DEFAULT_LOW_STOCK_THRESHOLD;
use pharmabill_invoicing::IssuerProfile;

pub const DATABASE_URL_VAR: &str = "PHARMABILL_DATABASE_URL";
pub const LOW_STOCK_THRESHOLD_VAR: &str = "PHARMABILL_LOW_STOCK_THRESHOLD";
pub const ISSUER_FILE_VAR: &str = "PHARMABILL_ISSUER_FILE";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pharmabill.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read issuer profile {path:?}: {source}")]
    IssuerFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed issuer profile {path:?}: {source}")]
    IssuerFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Lost on exit.
    Memory,
    /// SQLite database URL.
    Sqlite(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub low_stock_threshold: i64,
    pub issuer: IssuerProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Sqlite(DEFAULT_DATABASE_URL.to_string()),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            issuer: IssuerProfile::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup(DATABASE_URL_VAR).map(|v| v.trim().to_string()) {
            None => {
                tracing::info!("{DATABASE_URL_VAR} not set; using {DEFAULT_DATABASE_URL}");
                StoreBackend::Sqlite(DEFAULT_DATABASE_URL.to_string())
            }
            Some(url) if url.eq_ignore_ascii_case("memory") => StoreBackend::Memory,
            Some(url) if url.starts_with("sqlite:") => StoreBackend::Sqlite(url),
            Some(url) => {
                return Err(ConfigError::InvalidValue {
                    key: DATABASE_URL_VAR,
                    value: url,
                    reason: "expected a sqlite: URL or `memory`".to_string(),
                });
            }
        };

        let low_stock_threshold = match lookup(LOW_STOCK_THRESHOLD_VAR) {
            None => DEFAULT_LOW_STOCK_THRESHOLD,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) if value >= 0 => value,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: LOW_STOCK_THRESHOLD_VAR,
                        value: raw,
                        reason: "must not be negative".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        key: LOW_STOCK_THRESHOLD_VAR,
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        let issuer = match lookup(ISSUER_FILE_VAR) {
            None => {
                tracing::warn!("{ISSUER_FILE_VAR} not set; invoices will carry a placeholder issuer");
                IssuerProfile::default()
            }
            Some(path) => load_issuer(PathBuf::from(path))?,
        };

        Ok(Self {
            store,
            low_stock_threshold,
            issuer,
        })
    }
}

fn load_issuer(path: PathBuf) -> Result<IssuerProfile, ConfigError> {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::IssuerFile { path, source }),
    };
    serde_json::from_str(&raw).map_err(|source| ConfigError::IssuerFormat { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn memory_backend_and_threshold() {
        let config = AppConfig::from_lookup(lookup(&[
            (DATABASE_URL_VAR, "MEMORY"),
            (LOW_STOCK_THRESHOLD_VAR, " 25 "),
        ]))
        .unwrap();

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.low_stock_threshold, 25);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[(DATABASE_URL_VAR, "postgres://x")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(LOW_STOCK_THRESHOLD_VAR, "ten")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(LOW_STOCK_THRESHOLD_VAR, "-1")])).is_err());
    }

    #[test]
    fn loads_issuer_profile_from_json() {
        let path = std::env::temp_dir().join(format!("pharmabill-issuer-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "name": "Sai Agencies", "gstin": "27AAAAA0000A1Z5", "region": "goa" }"#,
        )
        .unwrap();

        let config =
            AppConfig::from_lookup(lookup(&[(ISSUER_FILE_VAR, path.to_str().unwrap())])).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.issuer.name, "Sai Agencies");
        assert_eq!(config.issuer.region, pharmabill_parties::Region::Goa);
        assert_eq!(config.issuer.tagline, IssuerProfile::default().tagline);
    }

    #[test]
    fn missing_issuer_file_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[(ISSUER_FILE_VAR, "/nonexistent/issuer.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::IssuerFile { .. }));
    }
}
