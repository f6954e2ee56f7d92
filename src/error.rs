//! Error taxonomy for the translation engine.
//!
//! Errors fall into three groups that decide how the orchestrator reacts:
//!
//! - configuration errors abort the run before any request is sent
//! - request errors are contained to a single batch (retried when transient),
//!   except a request that cannot be built at all
//! - persistence errors abort the run at the point they occur

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    /// Missing credential, bad language list, invalid batch size, etc.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The catalog file could not be read or is not a valid string catalog
    #[error("Failed to load catalog {}: {message}", path.display())]
    CatalogLoad { path: PathBuf, message: String },

    /// Transport-level failure: connection refused, DNS, timeout, truncated body
    #[error("Request to chat endpoint failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status
    #[error("Chat API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The completion did not contain a JSON array of the expected shape
    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),

    /// The request could not be built (serialization, invalid URL)
    #[error("Failed to build chat request: {0}")]
    RequestBuild(String),

    /// Writing the catalog back to disk failed
    #[error("Failed to save catalog {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },
}

impl TranslateError {
    /// Whether the failed request should be attempted again.
    ///
    /// Every error status from the endpoint is retried. A rejected credential
    /// never reaches this point: the client reports it as a configuration
    /// error.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Transport(_)
            | TranslateError::MalformedResponse(_)
            | TranslateError::Api { .. } => true,
            TranslateError::Configuration(_)
            | TranslateError::CatalogLoad { .. }
            | TranslateError::RequestBuild(_)
            | TranslateError::Persistence { .. } => false,
        }
    }

    /// Whether the error must abort the whole run rather than a single batch.
    ///
    /// A request that cannot even be built is a bug on our side, not a
    /// problem with one batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TranslateError::Configuration(_)
                | TranslateError::CatalogLoad { .. }
                | TranslateError::RequestBuild(_)
                | TranslateError::Persistence { .. }
        )
    }
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TranslateError::RequestBuild(err.to_string())
        } else {
            TranslateError::Transport(err.to_string())
        }
    }
}

pub type Result<T, E = TranslateError> = std::result::Result<T, E>;
