//! Store configuration.
//!
//! Resolved once at startup and handed to [`MirroredStore`](crate::store::MirroredStore);
//! nothing reads the environment while records are being read or written.

use std::time::Duration;
use thiserror::Error;

pub const ENDPOINT_VAR: &str = "UPA_DATA_API_URL";
pub const API_KEY_VAR: &str = "UPA_DATA_API_KEY";
pub const DATA_SOURCE_VAR: &str = "UPA_DATA_SOURCE";
pub const DATABASE_VAR: &str = "UPA_DATABASE";
pub const TIMEOUT_VAR: &str = "UPA_REMOTE_TIMEOUT_SECS";

pub const DEFAULT_DATA_SOURCE: &str = "Cluster0";
pub const DEFAULT_DATABASE: &str = "upa_pediatrica";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Connection settings for the remote document store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub data_source: String,
    pub database: String,
    pub timeout: Duration,
}

impl RemoteSettings {
    /// Settings with default data source, database and timeout.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Store configuration. `remote: None` selects local-only mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreConfig {
    pub remote: Option<RemoteSettings>,
}

impl StoreConfig {
    /// Local-only configuration.
    pub fn local_only() -> Self {
        Self { remote: None }
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load a `.env` file if present, then read the environment.
    pub fn load_dotenv() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Endpoint and API key must both be present (and non-blank) for the remote
    /// store to be used.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let (endpoint, api_key) = match (get(ENDPOINT_VAR), get(API_KEY_VAR)) {
            (Some(endpoint), Some(api_key)) => (endpoint, api_key),
            _ => return Ok(Self::local_only()),
        };

        let mut settings = RemoteSettings::new(endpoint, api_key);

        if let Some(data_source) = get(DATA_SOURCE_VAR) {
            settings.data_source = data_source;
        }
        if let Some(database) = get(DATABASE_VAR) {
            settings.database = database;
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            settings.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            remote: Some(settings),
        })
    }

    /// Whether a remote store is configured.
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_env_is_local_only() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.is_remote());
    }

    #[test]
    fn test_missing_api_key_is_local_only() {
        let config =
            StoreConfig::from_lookup(lookup(&[(ENDPOINT_VAR, "https://data.example.com")]))
                .unwrap();
        assert_eq!(config, StoreConfig::local_only());
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "https://data.example.com"),
            (API_KEY_VAR, "   "),
        ]))
        .unwrap();
        assert!(!config.is_remote());
    }

    #[test]
    fn test_remote_with_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "https://data.example.com"),
            (API_KEY_VAR, "secret"),
        ]))
        .unwrap();

        let remote = config.remote.unwrap();
        assert_eq!(remote.endpoint, "https://data.example.com");
        assert_eq!(remote.api_key, "secret");
        assert_eq!(remote.data_source, DEFAULT_DATA_SOURCE);
        assert_eq!(remote.database, DEFAULT_DATABASE);
        assert_eq!(remote.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_remote_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "https://data.example.com"),
            (API_KEY_VAR, "secret"),
            (DATA_SOURCE_VAR, "ward-cluster"),
            (DATABASE_VAR, "ward"),
            (TIMEOUT_VAR, "3"),
        ]))
        .unwrap();

        let remote = config.remote.unwrap();
        assert_eq!(remote.data_source, "ward-cluster");
        assert_eq!(remote.database, "ward");
        assert_eq!(remote.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_timeout() {
        for bad in ["soon", "0", "-2"] {
            let result = StoreConfig::from_lookup(lookup(&[
                (ENDPOINT_VAR, "https://data.example.com"),
                (API_KEY_VAR, "secret"),
                (TIMEOUT_VAR, bad),
            ]));
            assert_eq!(
                result,
                Err(ConfigError::InvalidValue {
                    var: TIMEOUT_VAR,
                    value: bad.to_string()
                })
            );
        }
    }
}
