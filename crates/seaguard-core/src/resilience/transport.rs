use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::{Result, SeaguardError};

use super::failure::RemoteFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// One call to the analysis service, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Parameters that identify the call for caching.
    pub fn cache_params(&self) -> Value {
        serde_json::json!({
            "path": self.path,
            "query": self.query,
            "body": self.body,
        })
    }
}

/// Raw status and body; classification happens in the retry layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The network seam. `Err` means the peer was not reached; an HTTP error status is an
/// `Ok` response.
pub trait Transport: Send + Sync {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    http: Client,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("seaguard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(network_error)?;
        Ok(ApiResponse { status, body })
    }
}

/// Timeouts stay as `Http` for the retry layer to rename; any other transport fault,
/// including a body cut off mid-read, is a retryable network failure.
fn network_error(err: reqwest::Error) -> SeaguardError {
    if err.is_timeout() {
        SeaguardError::Http(err)
    } else {
        SeaguardError::Remote(RemoteFailure::network(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use serde_json::json;

    use super::*;
    use crate::resilience::{CancelToken, RecordingSleeper, ResilientClient};

    #[test]
    fn cache_params_cover_path_query_and_body() {
        let a = ApiRequest::get("/api/fetch-csv/").with_query("url", "https://a/x.csv");
        let b = ApiRequest::get("/api/fetch-csv/").with_query("url", "https://b/x.csv");
        assert_ne!(a.cache_params(), b.cache_params());
        let post = ApiRequest::post("/api/predict/", json!({"vessel_id": "A"}));
        assert_eq!(post.cache_params()["body"]["vessel_id"], "A");
        assert_eq!(post.method.as_str(), "POST");
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(301, "").is_success());
        assert!(!ApiResponse::new(500, "").is_success());
    }

    #[test]
    fn http_transport_trims_trailing_slash() {
        let transport =
            HttpTransport::new("http://localhost:8000/", Duration::from_secs(1)).expect("client");
        assert_eq!(transport.base_url(), "http://localhost:8000");
    }

    #[test]
    fn body_cut_off_mid_read_is_retried_as_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = [0_u8; 4096];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                      Content-Length: 500\r\nConnection: close\r\n\r\n{\"st",
                );
            }
        });

        let base_url = format!("http://{address}");
        let transport = HttpTransport::new(&base_url, Duration::from_secs(5)).expect("client");
        let err = transport
            .send(&ApiRequest::get("/health"))
            .expect_err("truncated body");
        assert_eq!(err.code(), "NETWORK_ERROR");
        assert!(err.is_retryable());

        accepted.store(0, Ordering::SeqCst);
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = ResilientClient::new(Arc::new(transport)).with_sleeper(sleeper.clone());
        let err = client
            .send(&ApiRequest::get("/health"), &CancelToken::new())
            .expect_err("every attempt truncated");
        assert_eq!(err.code(), "NETWORK_ERROR");
        assert_eq!(accepted.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.delays().len(), 3);
    }
}
