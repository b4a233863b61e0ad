//! Error types for inies-dl
//!
//! Errors are split by the layer that produces them:
//! - [`AuthError`] for login and token refresh (fatal at startup)
//! - [`FetchError`] for authenticated catalogue calls, classified as transient or permanent
//! - [`Error::MetadataLoad`] wraps any failure while loading the norm taxonomy
//!
//! Per-record failures during a batch are not errors from the caller's point of view;
//! they are reported as [`RecordFailure`] values next to the successful records.

use crate::types::RecordId;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for inies-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of response body bytes kept in error values
pub(crate) const MAX_ERROR_BODY_LEN: usize = 512;

/// HTTP statuses considered transient by the retry executor
pub const TRANSIENT_STATUSES: [u16; 3] = [502, 503, 504];

/// Main error type for inies-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Login or token refresh failed
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Loading the norm / indicator / phase taxonomy failed
    #[error("metadata load failed{}: {source}", norm_suffix(*.norm_id))]
    MetadataLoad {
        /// Norm whose detail call failed (None when the norm list itself failed)
        norm_id: Option<i64>,
        /// Underlying failure
        source: Box<Error>,
    },

    /// Authenticated catalogue call failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// The retry executor's permit pool was closed
    #[error("shutdown in progress: not admitting new requests")]
    ShuttingDown,

    /// Date argument could not be parsed
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn norm_suffix(norm_id: Option<i64>) -> String {
    match norm_id {
        Some(id) => format!(" for norm {id}"),
        None => String::new(),
    }
}

impl Error {
    /// Wrap an error raised while loading reference metadata
    pub(crate) fn metadata(norm_id: Option<i64>, source: Error) -> Self {
        Error::MetadataLoad {
            norm_id,
            source: Box::new(source),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Fetch(FetchError::Status { status, .. }) => Some(*status),
            Error::Auth(AuthError::Rejected { status, .. }) => Some(*status),
            Error::MetadataLoad { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Login and refresh failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// Server answered with a non-success status
    #[error("{endpoint} rejected with HTTP {status}: {body}")]
    Rejected {
        /// Endpoint that was called ("login" or "refresh")
        endpoint: &'static str,
        /// HTTP status code
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// Request never produced a response
    #[error("transport failure: {0}")]
    Transport(reqwest::Error),

    /// Token response was not the expected shape
    #[error("invalid token response: {0}")]
    InvalidTokenResponse(#[source] serde_json::Error),

    /// Operator identity is not configured
    #[error("missing credential: {key} is not set")]
    MissingCredential {
        /// Name of the missing setting
        key: &'static str,
    },
}

/// Authenticated catalogue call failures
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
        /// Truncated response body
        body: String,
    },

    /// Response body did not match the expected payload
    #[error("could not decode response from {url}: {source}")]
    Decode {
        /// Requested URL
        url: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Whether this failure is worth another attempt
    ///
    /// Transport failures, undecodable payloads and gateway statuses
    /// (502, 503, 504) are transient; every other status is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => TRANSIENT_STATUSES.contains(status),
            FetchError::Decode { .. } => true,
        }
    }

    pub(crate) fn status(status: StatusCode, url: &str, body: &str) -> Self {
        FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body: truncate_body(body),
        }
    }
}

/// A record whose fetch failed after the retry budget was spent
///
/// Collected by the orchestrator instead of aborting the batch.
#[derive(Debug)]
pub struct RecordFailure {
    /// Record identifier from the index
    pub id: RecordId,
    /// Last error observed for this record
    pub error: Error,
}

impl std::fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record {}: {}", self.id, self.error)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
