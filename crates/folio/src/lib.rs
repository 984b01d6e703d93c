//! folio: turn an outlined PDF sourcebook into structured JSON.
//!
//! This is the public API facade crate. It re-exports the document model from
//! folio-core, reads documents through folio-parse, and ties the pipeline
//! stages together:
//!
//! 1. [`generate_manifest`] derives the section tree from the PDF outline.
//! 2. [`extract_sections`] writes one raw JSON file per selected section.
//! 3. [`transform_all`] maps raw sections into processed records using the
//!    transformer named by each section profile.
//!
//! # Architecture
//!
//! - **folio-core**: Backend-independent data types and algorithms
//! - **folio-parse**: lopdf-backed document reader
//! - **folio** (this crate): Pipeline stages and file layout

pub mod extract;
pub mod manifest;
pub mod output;
pub mod transform;

pub use folio_core;
pub use folio_parse;

pub use folio_core::{
    EntityDescriptor, EntityWindows, Error, Manifest, PageSource, Result, Section, TextBlock,
    TocEntry, locate_windows, slugify,
};
pub use folio_parse::LopdfSource;

pub use extract::{ExtractOptions, RawPage, RawSection, extract_sections, extract_sections_from};
pub use manifest::{
    build_manifest, generate_manifest, generate_manifest_from_toc, load_manifest,
    manifest_from_source, read_toc_file, write_manifest,
};
pub use output::OutputDir;
pub use transform::{SectionProfile, TransformerKind, find_section_file, load_profiles, transform_all};
