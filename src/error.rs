//! Error types
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are
//! surfaced to the caller unmodified; nothing here is retried.

use reqwest::StatusCode;
use std::fmt;

/// Boxed error used at the transport and decode seams
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An option value could not be encoded. Raised before any request is sent.
    #[error("invalid {field}: {reason}")]
    Encoding { field: &'static str, reason: String },

    /// The request never produced an HTTP response.
    #[error("{operation} {url}: transport failure: {source}")]
    Transport {
        operation: &'static str,
        url: String,
        #[source]
        source: BoxError,
    },

    /// The service answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A success response could not be decoded.
    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{operation}: request cancelled")]
    Cancelled { operation: &'static str },

    /// The token provider could not produce a token.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl Error {
    pub(crate) fn encoding(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Encoding {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            operation,
            source: source.into(),
        }
    }

    /// HTTP status of an API error
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(err) => Some(err.status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// A non-2xx answer from the workflow service
#[derive(Debug, Clone)]
pub struct ApiError {
    pub operation: &'static str,
    pub url: String,
    pub status: StatusCode,
    /// Raw response body
    pub body: String,
    /// Human readable message extracted from the body, when the service sent one
    pub message: Option<String>,
}

impl ApiError {
    pub(crate) fn new(operation: &'static str, url: String, status: StatusCode, body: String) -> Self {
        let message = extract_message(&body);
        Self {
            operation,
            url,
            status,
            body,
            message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} returned {}", self.operation, self.url, self.status)?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Pull the service message out of an error body.
///
/// Mistral answers with `faultstring`; proxies in front of it tend to use
/// `error_message`, `message` or `{"error": {"message": ..}}`.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    ["faultstring", "error_message", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .or_else(|| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
        })
        .map(str::to_string)
}
