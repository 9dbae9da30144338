use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeaguardError};
use crate::resilience::{CacheTtls, RetryPolicy};

mod env;

pub use env::{EnvSource, ProcessEnv};

use env::{
    ENV_API_URL, ENV_CACHE_TTL_SECS, ENV_HEALTH_CACHE_TTL_SECS, ENV_MAX_RETRIES,
    ENV_RETRY_INITIAL_MS, ENV_RETRY_MAX_MS, ENV_TIMEOUT_MS, read_env_u32, read_env_u64,
    read_non_empty_env,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_INITIAL_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_MS: u64 = 5_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_HEALTH_CACHE_TTL_SECS: u64 = 30;

/// Connection and resilience settings for the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub cache_ttl_secs: u64,
    pub health_cache_ttl_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_initial_delay_ms: DEFAULT_RETRY_INITIAL_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_MS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            health_cache_ttl_secs: DEFAULT_HEALTH_CACHE_TTL_SECS,
        }
    }
}

/// Command-line level overrides, applied last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

impl ServiceConfig {
    /// Defaults, then an optional TOML file, then the environment, then `overrides`.
    pub fn load(
        path: Option<&Path>,
        env: &dyn EnvSource,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        base.with_env(env)?.with_overrides(overrides).validated()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
            .map_err(|err| SeaguardError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| SeaguardError::Config(err.to_string()))
    }

    pub fn with_env(mut self, env: &dyn EnvSource) -> Result<Self> {
        if let Some(url) = read_non_empty_env(env, ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(value) = read_env_u64(env, ENV_TIMEOUT_MS)? {
            self.timeout_ms = value;
        }
        if let Some(value) = read_env_u32(env, ENV_MAX_RETRIES)? {
            self.max_retries = value;
        }
        if let Some(value) = read_env_u64(env, ENV_RETRY_INITIAL_MS)? {
            self.retry_initial_delay_ms = value;
        }
        if let Some(value) = read_env_u64(env, ENV_RETRY_MAX_MS)? {
            self.retry_max_delay_ms = value;
        }
        if let Some(value) = read_env_u64(env, ENV_CACHE_TTL_SECS)? {
            self.cache_ttl_secs = value;
        }
        if let Some(value) = read_env_u64(env, ENV_HEALTH_CACHE_TTL_SECS)? {
            self.health_cache_ttl_secs = value;
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(url) = overrides.base_url.as_deref() {
            self.base_url = url.trim().to_string();
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(max_retries) = overrides.max_retries {
            self.max_retries = max_retries;
        }
        self
    }

    pub fn validated(mut self) -> Result<Self> {
        self.base_url = normalize_base_url(&self.base_url)?;
        if self.timeout_ms == 0 {
            return Err(SeaguardError::Config(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.retry_max_delay_ms < self.retry_initial_delay_ms {
            return Err(SeaguardError::Config(format!(
                "retry_max_delay_ms ({}) is below retry_initial_delay_ms ({})",
                self.retry_max_delay_ms, self.retry_initial_delay_ms
            )));
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    pub fn cache_ttls(&self) -> CacheTtls {
        CacheTtls {
            default: Duration::from_secs(self.cache_ttl_secs),
            health: Duration::from_secs(self.health_cache_ttl_secs),
        }
    }
}

/// Accepts http(s) URLs without embedded credentials; strips trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| SeaguardError::Config(format!("invalid base_url {trimmed:?}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SeaguardError::Config(format!(
            "base_url must use http or https, got {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(SeaguardError::Config("base_url has no host".to_string()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(SeaguardError::Config(
            "base_url must not embed credentials".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ServiceConfig::load(None, &no_env, &ConfigOverrides::default())
            .expect("defaults");
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, Duration::from_millis(5000));
        let ttls = config.cache_ttls();
        assert_eq!(ttls.default, Duration::from_secs(300));
        assert_eq!(ttls.health, Duration::from_secs(30));
    }

    #[test]
    fn layers_apply_file_then_env_then_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("seaguard.toml");
        fs::write(
            &path,
            "base_url = \"https://file.example\"\ntimeout_ms = 1000\nmax_retries = 1\n",
        )
        .expect("write");

        let env = |name: &str| match name {
            "SEAGUARD_TIMEOUT_MS" => Some("2000".to_string()),
            "SEAGUARD_MAX_RETRIES" => Some("5".to_string()),
            _ => None,
        };
        let overrides = ConfigOverrides {
            max_retries: Some(0),
            ..ConfigOverrides::default()
        };
        let config = ServiceConfig::load(Some(&path), &env, &overrides).expect("load");
        assert_eq!(config.base_url, "https://file.example");
        assert_eq!(config.timeout_ms, 2000);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn rejects_unknown_file_keys() {
        let err = ServiceConfig::from_toml_str("bogus = 1").expect_err("unknown key");
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn base_url_must_be_plain_http() {
        assert_eq!(
            normalize_base_url("https://api.example/ ").expect("valid"),
            "https://api.example"
        );
        assert!(normalize_base_url("ftp://api.example").is_err());
        assert!(normalize_base_url("https://user:pw@api.example").is_err());
        assert!(normalize_base_url("nonsense").is_err());
    }

    #[test]
    fn inverted_backoff_bounds_are_rejected() {
        let config = ServiceConfig {
            retry_initial_delay_ms: 10_000,
            ..ServiceConfig::default()
        };
        assert!(config.validated().is_err());
    }
}
