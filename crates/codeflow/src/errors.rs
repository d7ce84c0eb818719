//! Error types for the concept tracker.
//!
//! Registry outcomes are soft errors the API reports with a 200 body;
//! extraction and validation failures are the only hard failures.

use thiserror::Error;

/// Failure to resolve a caller's session token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token is empty")]
    Empty,

    #[error("session token too long ({0} chars, max 256)")]
    TooLong(usize),

    #[error("session token contains invalid characters")]
    InvalidCharacters,
}

/// Lookup failures on the concept registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session not found")]
    UnknownSession,

    #[error("Concept not found")]
    UnknownConcept,
}

/// Failure at the LLM collaborator boundary.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("LLM request failed: {0}")]
    Transport(String),

    #[error("LLM backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM call timed out after {0}s")]
    Timeout(u64),

    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    #[error("failed to read document: {0}")]
    Unreadable(String),
}

impl From<reqwest::Error> for ExtractionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Malformed request payload, rejected before any state is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Invalid(String),

    #[error("File exceeds size limit ({size} bytes, max {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

impl ValidationError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Invalid(errors.to_string())
    }
}

/// Upload rejected or not stored. Extraction failures are not in here: a
/// stored file with failed extraction is a partial success, not an error.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
}
