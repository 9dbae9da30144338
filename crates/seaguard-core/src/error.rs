use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::resilience::RemoteFailure;

pub type Result<T> = std::result::Result<T, SeaguardError>;

#[derive(Debug, Error)]
pub enum SeaguardError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid coordinate at index {index}: {reason}")]
    InvalidCoordinate { index: usize, reason: String },

    #[error("no vessels supplied")]
    EmptyInput,

    #[error("no valid vessel rows: {0}")]
    EmptyResult(String),

    #[error("request timed out after {timeout_ms} ms")]
    NetworkTimeout { timeout_ms: u64 },

    #[error("{0}")]
    Remote(RemoteFailure),

    #[error("nothing to export")]
    EmptyExport,

    #[error("invalid data format: {0}")]
    InvalidDataFormat(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub suggestion: String,
    pub operation: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl SeaguardError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "PARSE_ERROR",
            Self::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::EmptyResult(_) => "EMPTY_RESULT",
            Self::NetworkTimeout { .. } => "NETWORK_TIMEOUT",
            Self::Remote(failure) => failure.code,
            Self::EmptyExport => "EMPTY_EXPORT",
            Self::InvalidDataFormat(_) => "INVALID_DATA_FORMAT",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::Cancelled => "CANCELLED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Http(_) => "HTTP_ERROR",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote(failure) => Some(failure.status),
            Self::NetworkTimeout { .. } => Some(408),
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Parse(_) => {
                "check that the first line is a header containing latitude and longitude"
            }
            Self::InvalidCoordinate { .. } => {
                "latitude must be within [-90, 90] and longitude within [-180, 180]"
            }
            Self::EmptyInput => "supply at least one vessel position",
            Self::EmptyResult(_) => "fix the rejected rows and try again",
            Self::NetworkTimeout { .. } => "check your network connection and retry",
            Self::Remote(failure) => failure.suggestion,
            Self::EmptyExport => "run an analysis before exporting",
            Self::InvalidDataFormat(_) => "verify the source returns vessel rows with valid coordinates",
            Self::InvalidUrl(_) => "use an http(s) link to a .csv file or a GitHub file",
            Self::Cancelled => "start the request again if you still need the result",
            Self::Config(_) => "check the configuration file and SEAGUARD_* variables",
            Self::Io(_) => "check the file path and permissions",
            Self::Json(_) => "check that the input is well-formed JSON",
            Self::Http(_) => "check that the analysis service is reachable",
        }
    }

    /// Whether the request layer may try the same call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(failure) => failure.is_retryable(),
            Self::NetworkTimeout { .. } => true,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    pub fn to_payload(&self, operation: impl Into<String>) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            suggestion: self.suggestion().to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
            status: self.status(),
        }
    }
}
