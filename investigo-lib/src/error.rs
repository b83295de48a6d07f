//! Error handling for probing operations.
//!
//! Per-site failures (transport problems, unsupported strategies) are carried
//! inside each `ProbeResult` as data. The variants here are what the library
//! returns from fallible calls: catalog loading, configuration, fetch
//! primitives, and the rare task that dies without producing a result.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the investigo library.
#[derive(Debug, Clone, Error)]
pub enum InvestigoError {
    /// Connection, DNS, TLS, timeout or proxy failure while fetching a URL
    #[error("{message}")]
    Transport { url: String, message: String },

    /// The site declares an error-detection strategy the classifier does not implement
    #[error("Unsupported error type `{name}`")]
    UnsupportedStrategy { name: String },

    /// The site catalog could not be read or parsed
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Invalid settings in a config file, environment variable or argument
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File I/O errors when reading configuration or catalogs
    #[error("File error at '{path}': {message}")]
    File { path: String, message: String },

    /// A probe task panicked or was cancelled before producing a result
    #[error("Probe task failed: {message}")]
    TaskFailed { message: String },

    /// Invalid handle supplied by the caller
    #[error("Invalid handle '{handle}': {reason}")]
    InvalidHandle { handle: String, reason: String },

    /// Generic internal errors that don't fit other categories
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl InvestigoError {
    /// Create a new transport error for `url`.
    pub fn transport<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a transport error describing an elapsed request timeout.
    pub fn timeout<U: Into<String>>(url: U, after: Duration) -> Self {
        let url = url.into();
        let message = format!("request to {} timed out after {:?}", url, after);
        Self::Transport { url, message }
    }

    /// Create a new unsupported strategy error.
    pub fn unsupported_strategy<N: Into<String>>(name: N) -> Self {
        Self::UnsupportedStrategy { name: name.into() }
    }

    /// Create a new catalog error.
    pub fn catalog<M: Into<String>>(message: M) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid handle error.
    pub fn invalid_handle<H: Into<String>, R: Into<String>>(handle: H, reason: R) -> Self {
        Self::InvalidHandle {
            handle: handle.into(),
            reason: reason.into(),
        }
    }

    /// Create a new task failure error.
    pub fn task_failed<M: Into<String>>(message: M) -> Self {
        Self::TaskFailed {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is a per-site transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for InvestigoError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        Self::Transport {
            url,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for InvestigoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Catalog {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<std::io::Error> for InvestigoError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<tokio::task::JoinError> for InvestigoError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::task_failed("task was cancelled")
        } else {
            Self::task_failed(format!("task panicked: {}", err))
        }
    }
}
