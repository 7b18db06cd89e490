//! Store error types.

use thiserror::Error;

/// Errors a daily log store can report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store is not configured
    #[error("Store not configured: {0}")]
    NotConfigured(String),

    /// Failed to reach the store
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Remote store answered with a non-success status
    #[error("Server returned status {status}: {message}")]
    Http { status: u16, message: String },

    /// Response or row could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local database error
    #[error("Database error: {message}")]
    Database { message: String, busy: bool },

    /// Upsert completed but returned no row
    #[error("Store returned no row for {0}")]
    MissingRow(String),
}

impl StoreError {
    /// Whether repeating the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Connection(_) | StoreError::Timeout => true,
            StoreError::Http { status, .. } => *status == 429 || *status >= 500,
            StoreError::Database { busy, .. } => *busy,
            StoreError::NotConfigured(_) | StoreError::Decode(_) | StoreError::MissingRow(_) => {
                false
            }
        }
    }
}
