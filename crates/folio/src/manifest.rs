//! Manifest generation and persistence.
//!
//! The manifest is the pipeline's only intermediate representation: it is
//! generated wholesale from a document's outline, written once, and read by
//! every later stage.

use std::path::{Path, PathBuf};

use folio_core::{
    Error, Manifest, PageSource, Result, TocEntry, build_sections, normalize_outline,
    parse_toc_rows,
};
use folio_parse::LopdfSource;
use tracing::{debug, info};

use crate::output::{read_json, write_json_file};

/// Build a manifest from the outline of the PDF at `pdf_path`.
///
/// The stored `pdf_path` is the canonical absolute path. When `output` is
/// given the manifest is also written there.
///
/// # Errors
///
/// [`Error::MissingDocument`] if `pdf_path` does not exist, [`Error::Pdf`] if
/// the document cannot be read.
pub fn generate_manifest(pdf_path: &Path, output: Option<&Path>) -> Result<Manifest> {
    let (pdf_path, source) = open_document(pdf_path)?;
    let manifest = manifest_from_source(path_string(&pdf_path), &source)?;
    if let Some(output) = output {
        write_manifest(&manifest, output)?;
    }
    Ok(manifest)
}

/// Like [`generate_manifest`], but with the table of contents taken from a
/// JSON file of `[level, title, page]` rows instead of the PDF outline.
///
/// The PDF is still opened for its page count.
pub fn generate_manifest_from_toc(
    pdf_path: &Path,
    toc_path: &Path,
    output: Option<&Path>,
) -> Result<Manifest> {
    let entries = read_toc_file(toc_path)?;
    let (pdf_path, source) = open_document(pdf_path)?;
    let manifest = build_manifest(path_string(&pdf_path), source.page_count(), &entries);
    if let Some(output) = output {
        write_manifest(&manifest, output)?;
    }
    Ok(manifest)
}

/// Build a manifest from any [`PageSource`]'s outline.
pub fn manifest_from_source<S: PageSource + ?Sized>(
    pdf_path: impl Into<String>,
    source: &S,
) -> Result<Manifest> {
    let outline = source.outline()?;
    let entries = normalize_outline(&outline);
    debug!(
        outline_items = outline.len(),
        toc_entries = entries.len(),
        "normalized outline"
    );
    Ok(build_manifest(pdf_path, source.page_count(), &entries))
}

/// Build a manifest from an already-normalized table of contents.
pub fn build_manifest(
    pdf_path: impl Into<String>,
    page_count: usize,
    entries: &[TocEntry],
) -> Manifest {
    let manifest = Manifest {
        pdf_path: pdf_path.into(),
        page_count,
        sections: build_sections(entries, page_count),
    };
    info!(
        pdf = %manifest.pdf_path,
        page_count,
        sections = manifest.iter().count(),
        "built manifest"
    );
    manifest
}

/// Read a JSON table-of-contents file.
///
/// Malformed rows are dropped; a file that is not an array is an error.
pub fn read_toc_file(path: &Path) -> Result<Vec<TocEntry>> {
    let value: serde_json::Value = read_json(path)?;
    parse_toc_rows(&value)
}

/// Write a manifest as pretty-printed JSON, creating the parent directory.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<PathBuf> {
    let path = write_json_file(path, manifest)?;
    info!(path = %path.display(), "wrote manifest");
    Ok(path)
}

/// Load and validate a manifest written by [`write_manifest`].
///
/// # Errors
///
/// [`Error::MalformedManifest`] on unknown fields, wrong types, or page
/// numbers below 1.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let malformed = |reason: String| Error::MalformedManifest {
        path: path.to_path_buf(),
        reason,
    };
    let manifest: Manifest = serde_json::from_str(&text).map_err(|e| malformed(e.to_string()))?;
    manifest.validate().map_err(malformed)?;
    Ok(manifest)
}

fn open_document(pdf_path: &Path) -> Result<(PathBuf, LopdfSource)> {
    if !pdf_path.exists() {
        return Err(Error::MissingDocument(pdf_path.to_path_buf()));
    }
    let pdf_path = pdf_path
        .canonicalize()
        .map_err(|e| Error::io(pdf_path, e))?;
    let source = LopdfSource::open(&pdf_path)?;
    Ok((pdf_path, source))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
