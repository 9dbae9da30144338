//! Timeout, retry with exponential backoff, error classification and a TTL cache around
//! every call to the analysis service.

mod cache;
mod cancel;
mod clock;
mod failure;
mod policy;
mod transport;

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{Result, SeaguardError};

pub use cache::{CacheKey, TtlCache};
pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, RecordingSleeper, Sleeper, SystemClock, ThreadSleeper};
pub use failure::{NETWORK_STATUS, RemoteFailure};
pub use policy::{CacheTtls, RetryPolicy};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

/// Upper bound on how long a blocked caller goes without checking for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct ResilientClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: Duration,
    ttls: CacheTtls,
    cache: TtlCache,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .field("ttls", &self.ttls)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            ttls: CacheTtls::default(),
            cache: TtlCache::new(Arc::new(SystemClock)),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// HTTP client for `config.base_url` with the configured timeout, retry and TTLs.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.base_url, config.timeout())?;
        Ok(Self::new(Arc::new(transport)).with_config(config))
    }

    #[must_use]
    pub fn with_config(self, config: &ServiceConfig) -> Self {
        self.with_policy(config.retry_policy())
            .with_timeout(config.timeout())
            .with_ttls(config.cache_ttls())
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    /// Replaces the cache with an empty one driven by `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = TtlCache::new(clock);
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Uncached call with timeout and retry.
    pub fn send(&self, request: &ApiRequest, cancel: &CancelToken) -> Result<Value> {
        let mut retry = 0_u32;
        loop {
            if cancel.is_cancelled() {
                return Err(SeaguardError::Cancelled);
            }
            debug!(
                method = request.method.as_str(),
                path = %request.path,
                attempt = retry + 1,
                "sending request"
            );
            match self.attempt(request, cancel) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.policy.max_retries => {
                    let delay = self.policy.delay_before_retry(retry);
                    warn!(
                        path = %request.path,
                        attempt = retry + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "request failed; retrying"
                    );
                    self.sleeper.sleep(delay, cancel)?;
                    retry += 1;
                }
                Err(err) => {
                    debug!(
                        path = %request.path,
                        attempts = retry + 1,
                        code = err.code(),
                        "request failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Memoized call keyed by `operation` and the request parameters.
    pub fn send_cached(
        &self,
        operation: &str,
        request: &ApiRequest,
        ttl: Duration,
        cancel: &CancelToken,
    ) -> Result<Value> {
        let key = CacheKey::new(operation, &request.cache_params());
        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }
        let value = self.send(request, cancel)?;
        let purged = self.cache.purge_expired();
        if purged > 0 {
            debug!(purged, "expired cache entries dropped");
        }
        self.cache.insert(key, value.clone(), ttl);
        Ok(value)
    }

    /// One attempt on a worker thread, bounded by the timeout and abandoned on cancel.
    fn attempt(&self, request: &ApiRequest, cancel: &CancelToken) -> Result<Value> {
        let (tx, rx) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        let owned = request.clone();
        thread::Builder::new()
            .name("seaguard-request".to_string())
            .spawn(move || {
                let _ = tx.send(transport.send(&owned));
            })?;

        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let deadline = Instant::now() + self.timeout;
        let response = loop {
            if cancel.is_cancelled() {
                return Err(SeaguardError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(SeaguardError::NetworkTimeout { timeout_ms });
            }
            match rx.recv_timeout((deadline - now).min(CANCEL_POLL_INTERVAL)) {
                Ok(result) => break result,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SeaguardError::Remote(RemoteFailure::network(
                        "request worker exited without a response",
                    )));
                }
            }
        };

        let response = response.map_err(|err| match err {
            SeaguardError::Http(inner) if inner.is_timeout() => {
                SeaguardError::NetworkTimeout { timeout_ms }
            }
            other => other,
        })?;
        decode_response(response)
    }
}

fn decode_response(response: ApiResponse) -> Result<Value> {
    if !response.is_success() {
        return Err(SeaguardError::Remote(RemoteFailure::from_status(
            response.status,
            Some(&response.body),
        )));
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|err| {
        SeaguardError::InvalidDataFormat(format!("response body is not JSON: {err}"))
    })
}
