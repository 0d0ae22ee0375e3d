//! Error types for coverdesk-data
//!
//! Classification results (parse outcomes, fetch results, submission
//! outcomes) are values, not errors. `DataError` covers the conditions that
//! abort an operation outright.

use std::path::PathBuf;
use thiserror::Error;

/// Operation-aborting errors
#[derive(Debug, Error)]
pub enum DataError {
    /// The caller cancelled the operation; no cache state was changed
    #[error("Operation cancelled")]
    Cancelled,

    /// No session is configured for a network operation
    #[error("No session: log in before fetching or submitting records")]
    MissingSession,

    /// An attachment could not be prepared for upload
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// coverdesk-common error
    #[error("Common error: {0}")]
    Common(#[from] coverdesk_common::Error),
}

/// Attachment preparation failure
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// File could not be read from disk
    #[error("Failed to read attachment '{file_name}' from {path:?}: {source}")]
    Read {
        file_name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// MIME type is not of the form `type/subtype`
    #[error("Attachment '{file_name}' has invalid MIME type '{mime_type}'")]
    InvalidMimeType { file_name: String, mime_type: String },
}

/// Result type for coverdesk-data operations
pub type DataResult<T> = Result<T, DataError>;
