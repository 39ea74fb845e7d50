//! Error types for spreadsheet normalization.

use thiserror::Error;

/// Result type alias for normalization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while normalizing a workbook.
#[derive(Error, Debug)]
pub enum Error {
    /// The bytes are not a workbook calamine can open.
    #[error("Unreadable workbook: {0}")]
    Unreadable(String),

    /// A worksheet exists but could not be read.
    #[error("Failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    /// No sheet contained a single populated cell.
    #[error("Workbook produced no content")]
    EmptyResult,
}

impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        Error::Unreadable(err.to_string())
    }
}
