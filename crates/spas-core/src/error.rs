//! Error types for the SPAS client
//!
//! Every failure a caller can observe is one of the kinds in [`ErrorKind`].
//! The executor wraps terminal failures in [`Error::Operation`] so that the
//! operation and attempt count travel with the original cause.

use crate::request::Operation;
use thiserror::Error;

/// Result type alias for SPAS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the SPAS client
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied input is structurally invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level failure (connection refused, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// A single call got no response in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The whole operation ran out of time; retrying cannot help
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The remote service answered with an error status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the service
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Well-formed request with no matching record
    #[error("Not found: {0}")]
    NotFound(String),

    /// The client was used after it was closed
    #[error("Client is closed: {0}")]
    Closed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payload could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Terminal failure of one logical operation, with context
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    Operation {
        /// Remote operation that failed
        operation: Operation,
        /// Number of attempts made, including the first
        attempts: u32,
        /// Last observed failure
        #[source]
        source: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Flat classification of [`Error`], ignoring operation context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Timeout,
    Api,
    NotFound,
    Closed,
    Config,
    Decode,
    Other,
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an API error for a response status
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an error for an elapsed operation deadline
    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::DeadlineExceeded(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a usage error for a closed client
    pub fn closed(msg: impl Into<String>) -> Self {
        Self::Closed(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Attach operation context to a terminal failure
    pub fn in_operation(self, operation: Operation, attempts: u32) -> Self {
        Self::Operation {
            operation,
            attempts,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping operation context
    pub fn root(&self) -> &Error {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classify this error, looking through operation context
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) | Self::DeadlineExceeded(_) => ErrorKind::Timeout,
            Self::Api { .. } => ErrorKind::Api,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Closed(_) => ErrorKind::Closed,
            Self::Config(_) => ErrorKind::Config,
            Self::Json(_) => ErrorKind::Decode,
            Self::Operation { .. } | Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether another attempt could succeed
    ///
    /// Network failures, per-call timeouts, rate-limit rejections (429) and
    /// server errors (5xx) are transient. Everything else is permanent,
    /// including an exceeded operation deadline.
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    /// HTTP status carried by an API error
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Attempts made before the operation gave up, when known
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Operation { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Operation that failed, when known
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Operation { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
