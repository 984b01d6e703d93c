//! folio-core: Backend-independent data types and algorithms.
//!
//! This crate provides the document model ([`TocEntry`], [`Section`], [`Manifest`]),
//! the outline-to-section-tree builder, text normalization, and the entity
//! window locator used by folio. It knows nothing about PDF parsing; page
//! content arrives through the [`PageSource`] trait.

pub mod error;
pub mod outline;
pub mod section;
pub mod source;
pub mod text;
pub mod toc;
pub mod window;

pub use error::{Error, Result};
pub use outline::build_sections;
pub use section::{Manifest, Section, SectionIter, slugify};
pub use source::{PageSource, RawBlock, TextBlock};
pub use text::{normalize_page_text, normalize_pages, split_paragraphs};
pub use toc::{OutlineItem, TocEntry, normalize_outline, parse_toc_rows};
pub use window::{EntityDescriptor, EntityWindows, locate_windows};
