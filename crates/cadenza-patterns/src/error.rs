//! Error types for pattern-library loading

use thiserror::Error;

/// Errors raised while loading or validating a pattern library.
///
/// Library errors are startup-time failures: a library either loads
/// completely or not at all, and nothing is retried per request.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("invalid pattern definition {id:?}: {reason}")]
    InvalidPatternDefinition { id: String, reason: String },

    #[error("malformed pattern library document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported pattern library version {version}")]
    UnsupportedVersion { version: u32 },
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;
