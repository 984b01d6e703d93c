//! The document reader seam.
//!
//! The pipeline never touches a PDF library directly. Anything that can report
//! a page count, an outline, and per-page text (plus optional positional
//! blocks) implements [`PageSource`]; `folio-parse` provides the lopdf-backed
//! implementation.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::toc::OutlineItem;

/// A page-addressable document.
///
/// Page numbers are 1-based throughout.
pub trait PageSource {
    /// Total number of pages.
    fn page_count(&self) -> usize;

    /// The document outline in document order.
    fn outline(&self) -> Result<Vec<OutlineItem>>;

    /// Plain text of one page.
    fn page_text(&self, page_number: usize) -> Result<String>;

    /// Positional text blocks of one page.
    fn page_blocks(&self, page_number: usize) -> Result<Vec<RawBlock>>;

    /// Plain text and positional blocks of one page.
    ///
    /// Readers that derive both from one pass over the page override this.
    fn page_content(&self, page_number: usize) -> Result<(String, Vec<RawBlock>)> {
        Ok((self.page_text(page_number)?, self.page_blocks(page_number)?))
    }
}

/// A positional block as reported by a document reader.
///
/// Readers may leave any field unset; blocks without both a bounding box and
/// text are discarded by [`RawBlock::into_text_block`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBlock {
    /// `[x0, top, x1, bottom]` in page coordinates.
    pub bbox: Option<[f64; 4]>,
    pub text: Option<String>,
    /// Reader-assigned block number.
    pub number: Option<usize>,
    /// Reader-assigned block type (0 = text).
    pub kind: Option<u32>,
}

impl RawBlock {
    /// Convert into a serializable block, trimming its text.
    ///
    /// Returns `None` if the bounding box or text is missing.
    pub fn into_text_block(self) -> Option<TextBlock> {
        let bbox = self.bbox?;
        let text = self.text?;
        Some(TextBlock {
            bbox,
            text: text.trim().to_string(),
            number: self.number,
            kind: self.kind,
        })
    }
}

/// A positional text block as written to section JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: [f64; 4],
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<usize>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u32>,
}
