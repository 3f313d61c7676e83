//! Store configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Storage key the product list has always lived under.
pub const DEFAULT_STORAGE_KEY: &str = "mialacena_products";

pub const ENV_STORAGE_KEY: &str = "PANTRY_STORAGE_KEY";
pub const ENV_DATA_DIR: &str = "PANTRY_DATA_DIR";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the JSON product array is stored under.
    pub storage_key: String,
    /// Directory used by the file backend.
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: default_data_dir(),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `PANTRY_STORAGE_KEY` / `PANTRY_DATA_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`StoreConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(key) = lookup(ENV_STORAGE_KEY) {
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::invalid(ENV_STORAGE_KEY, key, "must not be empty"));
            }
            config.storage_key = key.to_string();
        }

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

/// `<data dir>/pantry`, falling back to `~/.local/share/pantry`.
fn default_data_dir() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("pantry")
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
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn defaults_use_the_historic_key() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert!(config.data_dir.ends_with("pantry"));
    }

    #[test]
    fn env_overrides_key_and_dir() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_STORAGE_KEY, "alacena"),
            (ENV_DATA_DIR, "/tmp/pantry-data"),
        ]))
        .unwrap();

        assert_eq!(config.storage_key, "alacena");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pantry-data"));
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[(ENV_STORAGE_KEY, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_STORAGE_KEY, .. }));
    }
}
