//! Error types shared across the pipeline.
//!
//! Component seams (storage, fetching, the LLM client) return typed
//! errors; the stages and `main` wrap them in `anyhow` with context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the file-backed storage shim.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The named file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Errors from downloading and extracting an article.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("No article text could be extracted from {0}")]
    EmptyBody(String),
}

/// Errors from the chat-completion service.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Cannot connect to the LLM service at {0}")]
    Connection(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to send LLM request: {0}")]
    Request(String),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("LLM response contained no message content")]
    EmptyReply,
}

/// A misconfiguration the user can fix: missing input files, an empty URL
/// list, a missing credential.
///
/// `main` prints the message followed by each guidance line and exits
/// without attempting any further work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConfigurationError {
    pub message: String,
    pub guidance: Vec<String>,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            guidance: Vec::new(),
        }
    }

    pub fn with_guidance(mut self, line: impl Into<String>) -> Self {
        self.guidance.push(line.into());
        self
    }
}
