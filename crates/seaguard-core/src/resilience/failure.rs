use std::fmt;

use serde_json::Value;

/// Status used when the peer was never reached.
pub const NETWORK_STATUS: u16 = 0;

const MAX_BODY_MESSAGE_CHARS: usize = 300;

/// A classified remote failure: status, machine code, message and a hint for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
    pub suggestion: &'static str,
}

impl RemoteFailure {
    /// Classifies an HTTP status. A FastAPI `{"detail": ...}` body, or any short
    /// plain-text body, becomes the message.
    pub fn from_status(status: u16, body: Option<&str>) -> Self {
        let (code, suggestion, fallback) = classify_status(status);
        let message = body
            .and_then(body_message)
            .unwrap_or_else(|| fallback.to_string());
        Self {
            status,
            code,
            message,
            suggestion,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        let (code, suggestion, _) = classify_status(NETWORK_STATUS);
        Self {
            status: NETWORK_STATUS,
            code,
            message: message.into(),
            suggestion,
        }
    }

    /// 400, 401 and 403 mean the request itself is wrong; everything else may be transient.
    pub const fn is_retryable(&self) -> bool {
        !matches!(self.status, 400 | 401 | 403)
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == NETWORK_STATUS {
            write!(f, "{}: {}", self.code, self.message)
        } else {
            write!(f, "{} ({}): {}", self.code, self.status, self.message)
        }
    }
}

fn classify_status(status: u16) -> (&'static str, &'static str, &'static str) {
    match status {
        NETWORK_STATUS => (
            "NETWORK_ERROR",
            "check your network connection and that the analysis service is running",
            "the analysis service could not be reached",
        ),
        400 => (
            "BAD_REQUEST",
            "check the submitted data format and try again",
            "the service rejected the request",
        ),
        401 => (
            "UNAUTHORIZED",
            "authentication is required; check your credentials",
            "the request was not authenticated",
        ),
        403 => (
            "FORBIDDEN",
            "you do not have permission for this operation",
            "the request was refused",
        ),
        404 => (
            "NOT_FOUND",
            "check the service URL and that the endpoint exists",
            "the requested resource was not found",
        ),
        408 => (
            "REQUEST_TIMEOUT",
            "the service took too long; retry with a smaller batch",
            "the service timed out",
        ),
        429 => (
            "RATE_LIMITED",
            "too many requests; wait a moment and retry",
            "the service is rate limiting requests",
        ),
        500..=599 => (
            "SERVER_ERROR",
            "the service is having trouble; try later or contact support",
            "the analysis service failed",
        ),
        _ => (
            "UNEXPECTED_STATUS",
            "retry, and contact support if the problem persists",
            "the service returned an unexpected status",
        ),
    }
}

fn body_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value.get("detail").or_else(|| value.get("message")) {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => None,
        };
    }
    if trimmed.starts_with('<') {
        return None;
    }
    Some(trimmed.chars().take(MAX_BODY_MESSAGE_CHARS).collect())
}
