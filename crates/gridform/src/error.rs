//! Error types for the gridform library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gridform operations.
///
/// Validation flows never surface these to callers; they degrade to
/// error strings inside a [`crate::ValidationOutcome`]. Processing flows
/// return them only when the underlying document cannot be decoded at all.
#[derive(Debug, Error)]
pub enum GridformError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error decoding a spreadsheet container.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    /// A required sheet is absent from the workbook.
    #[error("Missing sheet at index {0}")]
    MissingSheet(usize),
}

/// Result type alias for gridform operations.
pub type Result<T> = std::result::Result<T, GridformError>;
