//! Error handling for the tag service
//!
//! One string-variant enum keeps the taxonomy small: configuration problems,
//! remote I/O reported by the memory service, connection-state violations,
//! data conversion issues and unknown-tag lookups.

use thiserror::Error;

/// Tag service error type
#[derive(Error, Debug, Clone)]
pub enum TagSrvError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Remote memory service reported a non-zero status on connect/read/write
    #[error("Remote I/O error: {0}")]
    RemoteIoError(String),

    /// Operation attempted while the link is down, or connect exhausted
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Data handling errors (parsing, conversion, validation)
    #[error("Data error: {0}")]
    DataError(String),

    /// Tag lookup errors (unknown name)
    #[error("Tag error: {0}")]
    TagError(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for the tag service
pub type Result<T> = std::result::Result<T, TagSrvError>;

impl TagSrvError {
    pub fn config(msg: impl Into<String>) -> Self {
        TagSrvError::ConfigError(msg.into())
    }

    pub fn remote_io(msg: impl Into<String>) -> Self {
        TagSrvError::RemoteIoError(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        TagSrvError::ConnectionError(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        TagSrvError::DataError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        TagSrvError::InternalError(msg.into())
    }

    pub fn tag_not_found(name: impl std::fmt::Display) -> Self {
        TagSrvError::TagError(format!("Tag not found: {name}"))
    }

    pub fn not_connected() -> Self {
        TagSrvError::ConnectionError("Not connected".to_string())
    }
}

impl From<std::io::Error> for TagSrvError {
    fn from(err: std::io::Error) -> Self {
        TagSrvError::RemoteIoError(err.to_string())
    }
}

impl From<csv::Error> for TagSrvError {
    fn from(err: csv::Error) -> Self {
        TagSrvError::ConfigError(format!("CSV: {err}"))
    }
}
