//! Error types for the lopdf reader.
//!
//! Uses [`thiserror`] for ergonomic error derivation. [`ParseError`] converts
//! into [`folio_core::Error`] so reader failures flow through the pipeline's
//! single error type.

use thiserror::Error;

/// Error type for document reader operations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A page number outside `1..=page_count` was requested.
    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },
}

impl From<lopdf::Error> for ParseError {
    fn from(err: lopdf::Error) -> Self {
        ParseError::Parse(err.to_string())
    }
}

impl From<ParseError> for folio_core::Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::PageOutOfRange { page, page_count } => {
                folio_core::Error::PageOutOfRange { page, page_count }
            }
            other => folio_core::Error::Pdf(other.to_string()),
        }
    }
}
