//! Error type shared by every folio crate.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Fatal conditions are
//! variants of [`Error`]; locally recoverable conditions (a malformed TOC row,
//! an entity with no text window) never surface here and are logged instead.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout folio.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error types for the extraction pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The source document path does not exist.
    #[error("source document not found: {}", .0.display())]
    MissingDocument(PathBuf),

    /// A manifest file failed schema validation on load.
    #[error("malformed manifest {}: {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    /// A table-of-contents file is not a list of rows.
    #[error("malformed table of contents: {0}")]
    MalformedToc(String),

    /// The document reader failed.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// A section references a page the document does not have.
    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    /// Error reading or writing a file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error serializing or parsing JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A section profile names a transformer that does not exist.
    #[error("unknown transformer '{key}' for slug '{slug}'")]
    UnknownTransformer { key: String, slug: String },

    /// No raw section file matches a profile's slug.
    #[error("no raw section file found for slug '{slug}' in {}", dir.display())]
    SectionNotFound { slug: String, dir: PathBuf },

    /// A section profile file failed validation.
    #[error("malformed section profile: {0}")]
    MalformedProfile(String),
}

impl Error {
    /// Wrap an [`std::io::Error`] together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
