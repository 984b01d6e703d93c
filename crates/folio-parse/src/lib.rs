//! folio-parse: lopdf-backed document reader.
//!
//! Implements [`folio_core::PageSource`] for PDF files via
//! [lopdf](https://crates.io/crates/lopdf): the outline is read from the
//! catalog's `/Outlines` tree, and page text plus positional blocks come from
//! a lightweight walk over each page's content stream operators. Shown
//! strings are decoded through the page's fonts (`/ToUnicode` maps,
//! `/Differences`, two-byte composite fonts), and text drawn inside Form
//! XObjects is included.

mod cmap;
mod content;
mod decode;
pub mod error;
mod font;
mod outline;
pub mod source;

pub use error::ParseError;
pub use folio_core;
pub use source::LopdfSource;
