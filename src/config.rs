//! Client configuration via environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::DEFAULT_TOKEN_KEY;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Which `TokenStore` backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub token_store: StoreKind,
    pub token_file: PathBuf,
    pub token_key: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// All variables are optional: `API_BASE_URL`, `TOKEN_STORE`,
    /// `TOKEN_FILE`, `TOKEN_STORAGE_KEY`, `API_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::resolve(lookup, default_token_file)
    }

    fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        default_file: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let api_base_url = lookup("API_BASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        reqwest::Url::parse(&api_base_url)
            .map_err(|e| ConfigError::InvalidUrl(api_base_url.clone(), e.to_string()))?;

        let token_store = match lookup("TOKEN_STORE").as_deref() {
            None | Some("") | Some("file") => StoreKind::File,
            Some("memory") => StoreKind::Memory,
            Some(other) => return Err(ConfigError::UnknownStore(other.into())),
        };

        // Only the file store needs somewhere to live.
        let token_file = match (lookup("TOKEN_FILE").filter(|v| !v.is_empty()), &token_store) {
            (Some(path), _) => PathBuf::from(path),
            (None, StoreKind::File) => default_file().ok_or(ConfigError::NoDataDir)?,
            (None, StoreKind::Memory) => default_file().unwrap_or_default(),
        };

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token_store,
            token_file,
            token_key: lookup("TOKEN_STORAGE_KEY")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.into()),
            request_timeout: lookup("API_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
        })
    }
}

impl Config {
    /// Configuration for testing: in-memory store, all fields settable directly.
    pub fn test_default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            token_store: StoreKind::Memory,
            token_file: PathBuf::from("storage.json"),
            token_key: DEFAULT_TOKEN_KEY.into(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

fn default_token_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("expensio").join("storage.json"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API_BASE_URL {0:?}: {1}")]
    InvalidUrl(String, String),

    #[error("unknown TOKEN_STORE {0:?} (expected \"file\" or \"memory\")")]
    UnknownStore(String),

    #[error("no local data directory; set TOKEN_FILE")]
    NoDataDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[("TOKEN_FILE", "/tmp/s.json")])).unwrap();
        assert_eq!(cfg.api_base_url, "http://localhost:8080/api");
        assert_eq!(cfg.token_store, StoreKind::File);
        assert_eq!(cfg.token_key, "jwt_token");
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.token_file, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://expensio.example.com/api/"),
            ("TOKEN_STORE", "memory"),
            ("TOKEN_FILE", "/tmp/s.json"),
            ("TOKEN_STORAGE_KEY", "session"),
            ("API_TIMEOUT_MS", "5000"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_base_url, "https://expensio.example.com/api");
        assert_eq!(cfg.token_store, StoreKind::Memory);
        assert_eq!(cfg.token_key, "session");
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unparsable_timeout_falls_back() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("TOKEN_FILE", "/tmp/s.json"),
            ("API_TIMEOUT_MS", "soon"),
        ]))
        .unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = Config::from_lookup(lookup_from(&[("API_BASE_URL", "not a url")])).unwrap_err();
        assert!(err.to_string().contains("API_BASE_URL"));
    }

    #[test]
    fn test_unknown_store() {
        let err = Config::from_lookup(lookup_from(&[
            ("TOKEN_FILE", "/tmp/s.json"),
            ("TOKEN_STORE", "redis"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStore(ref s) if s == "redis"));
    }

    #[test]
    fn test_memory_store_needs_no_data_dir() {
        let cfg = Config::resolve(lookup_from(&[("TOKEN_STORE", "memory")]), || None).unwrap();
        assert_eq!(cfg.token_store, StoreKind::Memory);

        let err = Config::resolve(lookup_from(&[("TOKEN_STORE", "file")]), || None).unwrap_err();
        assert!(matches!(err, ConfigError::NoDataDir));
    }
}
