//! [`LopdfSource`]: a [`PageSource`] backed by lopdf.

use std::collections::HashMap;
use std::path::Path;

use folio_core::{OutlineItem, PageSource, RawBlock};

use crate::content::{TextObject, collect_text_objects};
use crate::decode::{object_to_f64, resolve, stream_bytes};
use crate::error::ParseError;
use crate::outline::read_outline;

/// US Letter height, used when a page has no usable `/MediaBox`.
const DEFAULT_PAGE_HEIGHT: f64 = 792.0;

/// A PDF document opened for reading.
///
/// The file is read into memory once on open; dropping the source releases it.
pub struct LopdfSource {
    inner: lopdf::Document,
    /// Page object ids in page order (index 0 is page 1).
    page_ids: Vec<lopdf::ObjectId>,
}

impl std::fmt::Debug for LopdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfSource")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl LopdfSource {
    /// Open a PDF file.
    pub fn open(path: &Path) -> Result<Self, ParseError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| ParseError::Parse(format!("failed to load PDF: {e}")))?;
        // get_pages returns a BTreeMap keyed by 1-based page number.
        let page_ids = inner.get_pages().values().copied().collect();
        Ok(Self { inner, page_ids })
    }

    fn page_id(&self, page_number: usize) -> Result<lopdf::ObjectId, ParseError> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.page_ids.get(index))
            .copied()
            .ok_or(ParseError::PageOutOfRange {
                page: page_number,
                page_count: self.page_ids.len(),
            })
    }

    fn page_dict(&self, page_number: usize) -> Result<&lopdf::Dictionary, ParseError> {
        let id = self.page_id(page_number)?;
        Ok(self.inner.get_object(id)?.as_dict()?)
    }

    /// Walk one page's content stream into text objects.
    fn text_objects(&self, page_number: usize) -> Result<Vec<TextObject>, ParseError> {
        let page = self.page_dict(page_number)?;
        let bytes = page_content_bytes(&self.inner, page)?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let content = lopdf::content::Content::decode(&bytes).map_err(|e| {
            ParseError::Parse(format!("page {page_number}: bad content stream: {e}"))
        })?;
        let resources = inherited(&self.inner, page, b"Resources")
            .and_then(|obj| resolve(&self.inner, obj).as_dict().ok());
        Ok(collect_text_objects(
            &self.inner,
            resources,
            &content.operations,
        ))
    }

    /// Page height from the (possibly inherited) `/MediaBox`.
    fn page_height(&self, page_number: usize) -> Result<f64, ParseError> {
        let page = self.page_dict(page_number)?;
        let height = inherited(&self.inner, page, b"MediaBox")
            .and_then(|obj| resolve(&self.inner, obj).as_array().ok())
            .filter(|arr| arr.len() == 4)
            .and_then(|arr| Some((object_to_f64(&arr[3])? - object_to_f64(&arr[1])?).abs()))
            .unwrap_or(DEFAULT_PAGE_HEIGHT);
        Ok(height)
    }

    fn page_numbers(&self) -> HashMap<lopdf::ObjectId, usize> {
        self.page_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index + 1))
            .collect()
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn outline(&self) -> folio_core::Result<Vec<OutlineItem>> {
        Ok(read_outline(&self.inner, &self.page_numbers()))
    }

    /// Each text line ends with a newline; text objects are separated by a
    /// blank line.
    fn page_text(&self, page_number: usize) -> folio_core::Result<String> {
        Ok(page_text(&self.text_objects(page_number)?))
    }

    fn page_blocks(&self, page_number: usize) -> folio_core::Result<Vec<RawBlock>> {
        let height = self.page_height(page_number)?;
        Ok(page_blocks(&self.text_objects(page_number)?, height))
    }

    /// Text and blocks from a single walk over the content stream.
    fn page_content(&self, page_number: usize) -> folio_core::Result<(String, Vec<RawBlock>)> {
        let height = self.page_height(page_number)?;
        let objects = self.text_objects(page_number)?;
        Ok((page_text(&objects), page_blocks(&objects, height)))
    }
}

fn page_text(objects: &[TextObject]) -> String {
    objects
        .iter()
        .map(|object| format!("{}\n", object.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn page_blocks(objects: &[TextObject], page_height: f64) -> Vec<RawBlock> {
    objects
        .iter()
        .enumerate()
        .map(|(number, object)| RawBlock {
            bbox: object.bbox(page_height),
            text: Some(object.text()),
            number: Some(number),
            kind: Some(0),
        })
        .collect()
}

/// Resolve a page attribute, following `/Parent` links for inherited keys.
fn inherited<'a>(
    doc: &'a lopdf::Document,
    page: &'a lopdf::Dictionary,
    key: &[u8],
) -> Option<&'a lopdf::Object> {
    let mut current = page;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?;
        current = resolve(doc, parent).as_dict().ok()?;
    }
    None
}

/// Concatenate and decompress a page's `/Contents` streams.
fn page_content_bytes(
    doc: &lopdf::Document,
    page: &lopdf::Dictionary,
) -> Result<Vec<u8>, ParseError> {
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };

    let streams: Vec<&lopdf::Object> = match resolve(doc, contents) {
        lopdf::Object::Array(items) => items.iter().map(|item| resolve(doc, item)).collect(),
        single => vec![single],
    };

    let mut content = Vec::new();
    for obj in streams {
        let stream = obj
            .as_stream()
            .map_err(|e| ParseError::Parse(format!("/Contents is not a stream: {e}")))?;
        let bytes = stream_bytes(stream)
            .map_err(|e| ParseError::Parse(format!("failed to decompress content stream: {e}")))?;
        if !content.is_empty() {
            content.push(b' ');
        }
        content.extend_from_slice(&bytes);
    }
    Ok(content)
}
