use crate::error::{Result, SeaguardError};

pub(super) const ENV_API_URL: &str = "SEAGUARD_API_URL";
pub(super) const ENV_TIMEOUT_MS: &str = "SEAGUARD_TIMEOUT_MS";
pub(super) const ENV_MAX_RETRIES: &str = "SEAGUARD_MAX_RETRIES";
pub(super) const ENV_RETRY_INITIAL_MS: &str = "SEAGUARD_RETRY_INITIAL_MS";
pub(super) const ENV_RETRY_MAX_MS: &str = "SEAGUARD_RETRY_MAX_MS";
pub(super) const ENV_CACHE_TTL_SECS: &str = "SEAGUARD_CACHE_TTL_SECS";
pub(super) const ENV_HEALTH_CACHE_TTL_SECS: &str = "SEAGUARD_HEALTH_CACHE_TTL_SECS";

/// Variable lookup, injectable so tests never touch the process environment.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

#[must_use]
pub(super) fn read_non_empty_env(env: &dyn EnvSource, name: &str) -> Option<String> {
    env.var(name)
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(super) fn read_env_u64(env: &dyn EnvSource, name: &str) -> Result<Option<u64>> {
    read_non_empty_env(env, name)
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                SeaguardError::Config(format!("{name} must be a non-negative integer, got {raw:?}"))
            })
        })
        .transpose()
}

pub(super) fn read_env_u32(env: &dyn EnvSource, name: &str) -> Result<Option<u32>> {
    read_env_u64(env, name)?
        .map(|value| {
            u32::try_from(value)
                .map_err(|_| SeaguardError::Config(format!("{name} is too large: {value}")))
        })
        .transpose()
}
