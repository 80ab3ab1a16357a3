//! `dynabase.toml` configuration.
//!
//! Every key has a default, so an empty file is a valid configuration.
//! Unknown keys are rejected.

use crate::{Error, catalog::LmfdbCatalog, error::ErrorClass};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to read config '{path}': {message}")]
    Read { path: String, message: String },
}

impl ConfigError {
    pub(crate) const fn class() -> ErrorClass {
        ErrorClass::Config
    }
}

///
/// DynabaseConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynabaseConfig {
    pub registry: RegistryConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
    pub store: StoreConfig,
}

impl DynabaseConfig {
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.max_label_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "registry.max_label_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.registry.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                key: "registry.timeout_ms",
                message: "must be positive; omit it for no deadline".to_string(),
            });
        }
        if self.store.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "store.busy_timeout_ms",
                message: "must be positive".to_string(),
            });
        }
        if self.catalog.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "catalog.timeout_ms",
                message: "must be positive".to_string(),
            });
        }
        let url = &self.catalog.base_url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: "catalog.base_url",
                message: format!("'{url}' is not an http(s) URL"),
            });
        }

        Ok(())
    }
}

///
/// CatalogPolicy
///
/// Whether registration consults the external catalog.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogPolicy {
    #[default]
    Skip,
    Advisory,
}

///
/// RegistryConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub max_label_attempts: u32,
    pub timeout_ms: Option<u64>,
    pub normalize_if_needed: bool,
    pub catalog: CatalogPolicy,
}

impl RegistryConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_label_attempts: 3,
            timeout_ms: None,
            normalize_if_needed: true,
            catalog: CatalogPolicy::Skip,
        }
    }
}

///
/// CatalogConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl CatalogConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: LmfdbCatalog::DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
        }
    }
}

///
/// LogConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Append-only event log; stderr when unset.
    pub path: Option<PathBuf>,
    pub debug: bool,
}

///
/// StoreConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database file shared by every process that registers fields.
    pub path: PathBuf,

    /// How long a writer waits for another process's transaction.
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dynabase.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = DynabaseConfig::from_toml("").unwrap();

        assert_eq!(config, DynabaseConfig::default());
        assert_eq!(config.registry.max_label_attempts, 3);
        assert_eq!(config.registry.timeout(), None);
        assert_eq!(config.catalog.timeout(), Duration::from_secs(10));
        assert_eq!(config.registry.catalog, CatalogPolicy::Skip);
    }

    #[test]
    fn reads_every_section() {
        let config = DynabaseConfig::from_toml(
            r#"
            [registry]
            max_label_attempts = 5
            timeout_ms = 2500
            normalize_if_needed = false
            catalog = "advisory"

            [catalog]
            base_url = "http://localhost:8080/api/nf_fields/"
            timeout_ms = 500

            [log]
            path = "fields.log"
            debug = true

            [store]
            path = "/tmp/fields.db"
            busy_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.max_label_attempts, 5);
        assert_eq!(config.registry.timeout(), Some(Duration::from_millis(2500)));
        assert!(!config.registry.normalize_if_needed);
        assert_eq!(config.registry.catalog, CatalogPolicy::Advisory);
        assert_eq!(config.catalog.timeout_ms, 500);
        assert_eq!(config.log.path, Some(PathBuf::from("fields.log")));
        assert!(config.log.debug);
        assert_eq!(config.store.path, PathBuf::from("/tmp/fields.db"));
        assert_eq!(config.store.busy_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = DynabaseConfig::from_toml("[registry]\nmax_attempts = 2\n").unwrap_err();

        assert_eq!(err.class, ErrorClass::Config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "[registry]\nmax_label_attempts = 0\n",
            "[registry]\ntimeout_ms = 0\n",
            "[catalog]\ntimeout_ms = 0\n",
            "[store]\nbusy_timeout_ms = 0\n",
            "[catalog]\nbase_url = \"ftp://example.org\"\n",
            "[registry]\ncatalog = \"always\"\n",
        ] {
            let err = DynabaseConfig::from_toml(text).unwrap_err();
            assert_eq!(err.class, ErrorClass::Config, "{text}");
        }
    }
}
