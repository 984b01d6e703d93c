//! Section extraction: slice page text into one JSON record per section.

use std::path::{Path, PathBuf};

use folio_core::{
    Error, Manifest, PageSource, Result, Section, TextBlock, normalize_pages,
};
use folio_parse::LopdfSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::output::OutputDir;

/// Options for [`extract_sections`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Sections shallower than this level are walked but not written.
    pub min_level: usize,
    /// Whether to include positional text blocks for each page.
    pub include_blocks: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_level: 2,
            include_blocks: true,
        }
    }
}

/// One page of a raw section record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub page_number: usize,
    pub text: String,
    /// Absent when extraction ran without blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<TextBlock>>,
}

/// The per-section JSON record written by the extractor and read by
/// transformers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    pub title: String,
    pub slug: String,
    pub level: usize,
    pub start_page: usize,
    pub end_page: usize,
    /// Ancestor slugs, root first.
    #[serde(default)]
    pub parent_slugs: Vec<String>,
    #[serde(default)]
    pub pages: Vec<RawPage>,
}

impl RawSection {
    /// `<level:02>-<start_page:03>-<slug>.json`, so that a lexical sort of
    /// file names approximates document order.
    pub fn file_name(section: &Section) -> String {
        format!(
            "{:02}-{:03}-{}.json",
            section.level, section.start_page, section.slug
        )
    }

    /// All page texts, normalized and joined.
    pub fn normalized_text(&self) -> String {
        normalize_pages(self.pages.iter().map(|page| page.text.as_str()))
    }

    /// Read one section's pages from `source`.
    pub fn read<S: PageSource + ?Sized>(
        source: &S,
        section: &Section,
        parent_slugs: &[&str],
        include_blocks: bool,
    ) -> Result<Self> {
        let mut pages = Vec::with_capacity(section.page_span().count());
        for page_number in section.page_span() {
            let (text, blocks) = if include_blocks {
                let (text, blocks) = source.page_content(page_number)?;
                let blocks = blocks
                    .into_iter()
                    .filter_map(|block| block.into_text_block())
                    .collect();
                (text, Some(blocks))
            } else {
                (source.page_text(page_number)?, None)
            };
            pages.push(RawPage {
                page_number,
                text,
                blocks,
            });
        }
        Ok(Self {
            title: section.title.clone(),
            slug: section.slug.clone(),
            level: section.level,
            start_page: section.start_page,
            end_page: section.end_page,
            parent_slugs: parent_slugs.iter().map(|slug| slug.to_string()).collect(),
            pages,
        })
    }
}

/// Extract every section at or below `options.min_level` of `manifest` into
/// `output_dir`, reading the PDF named by the manifest.
///
/// The document is opened once and closed when extraction returns. Files
/// written before a failure are left in place.
///
/// # Errors
///
/// [`Error::MissingDocument`] if the manifest's PDF does not exist. Reader and
/// I/O failures abort the run.
pub fn extract_sections(
    manifest: &Manifest,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<Vec<PathBuf>> {
    let pdf_path = Path::new(&manifest.pdf_path);
    if !pdf_path.exists() {
        return Err(Error::MissingDocument(pdf_path.to_path_buf()));
    }
    let out = OutputDir::create(output_dir)?;
    let source = LopdfSource::open(pdf_path)?;
    extract_sections_from(manifest, &source, &out, options)
}

/// Extract sections reading pages from an already-open [`PageSource`].
///
/// The tree is walked depth-first in document order; every section is
/// visited so deep sections are reached beneath skipped shallow ones.
pub fn extract_sections_from<S: PageSource + ?Sized>(
    manifest: &Manifest,
    source: &S,
    out: &OutputDir,
    options: &ExtractOptions,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (section, parents) in manifest.iter() {
        if section.level < options.min_level {
            continue;
        }
        let raw = RawSection::read(source, section, &parents, options.include_blocks)?;
        let path = out.write_json(&RawSection::file_name(section), &raw)?;
        debug!(
            slug = %section.slug,
            pages = raw.pages.len(),
            path = %path.display(),
            "extracted section"
        );
        written.push(path);
    }
    info!(
        sections = written.len(),
        dir = %out.path().display(),
        min_level = options.min_level,
        "extraction complete"
    );
    Ok(written)
}
