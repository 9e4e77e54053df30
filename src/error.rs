use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("directory lookup failed for {entity}: {message}")]
    DirectoryLookup { entity: String, message: String },

    #[error("admin set computation failed: {0}")]
    Cache(String),
}

/// Errors raised by a [`DirectoryClient`](crate::DirectoryClient).
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory lookup timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("malformed directory response: {0}")]
    Malformed(String),
}

/// An error raised by a delegated [`SubPolicy`](crate::SubPolicy).
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("sub-policy '{domain}' failed: {message}")]
pub struct SubPolicyError {
    pub domain: String,
    pub message: String,
}

impl SubPolicyError {
    pub fn new(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::Config(err.to_string())
    }
}

impl From<regex::Error> for PolicyError {
    fn from(err: regex::Error) -> Self {
        PolicyError::InvalidFormat(err.to_string())
    }
}
