use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

/// Result type for httptool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for httptool
///
/// Every failure of a request invocation is returned to the caller as one of
/// these variants. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum Error {
    /// A request option failed to apply
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The HTTP method could not be parsed
    #[error("Invalid method: {0:?}")]
    InvalidMethod(String),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The request could not be constructed from a parsed method and URL
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failures (DNS, connect, TLS, protocol)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request deadline elapsed
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The cancellation scope fired before the request completed
    #[error("Request cancelled")]
    Cancelled,

    /// The server answered with anything other than 200 OK
    #[error("non 200 response, response code: {}", .status.as_u16())]
    UnexpectedStatus { status: StatusCode, body: Bytes },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while applying options, before any request exists
    Option,
    /// Raised while building the request, before any network access
    Construction,
    /// Raised by the dispatch itself, including timeout and cancellation
    Dispatch,
    /// The dispatch succeeded but the status was not 200
    Status,
    /// JSON encoding or decoding failed
    Json,
}

impl Error {
    /// Create a new invalid option error
    pub fn invalid_option(message: impl Into<String>) -> Self {
        Error::InvalidOption(message.into())
    }

    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout(duration: std::time::Duration) -> Self {
        Error::Timeout { duration }
    }

    /// Where in the pipeline this error was raised
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidOption(_) => ErrorKind::Option,
            Error::InvalidMethod(_) | Error::Url(_) | Error::InvalidRequest(_) => {
                ErrorKind::Construction
            }
            Error::Network(_) | Error::Timeout { .. } | Error::Cancelled => ErrorKind::Dispatch,
            Error::UnexpectedStatus { .. } => ErrorKind::Status,
            Error::Json(_) => ErrorKind::Json,
        }
    }

    /// The response status, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The drained body of a non-200 response
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Error::UnexpectedStatus { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Network(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// Check if the cancellation scope ended the request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Get the underlying reqwest error if this is a network error
    pub fn as_network_error(&self) -> Option<&reqwest::Error> {
        match self {
            Error::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::InvalidOption(format!("Invalid header name: {}", err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::InvalidOption(format!("Invalid header value: {}", err))
    }
}
