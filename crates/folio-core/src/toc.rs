//! Table-of-contents entries and their normalization.
//!
//! A TOC arrives either as [`OutlineItem`]s read from a document outline or as
//! raw JSON rows of the form `[level, title, page]`. Both are normalized into
//! [`TocEntry`] values; rows that do not fit that shape are dropped one by one
//! rather than failing the whole TOC.

use serde_json::Value;

use crate::error::{Error, Result};

/// A single normalized table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Nesting level. Top-level entries conventionally have level 1.
    pub level: usize,
    /// Entry title, trimmed.
    pub title: String,
    /// 1-based starting page.
    pub page: usize,
}

impl TocEntry {
    pub fn new(level: usize, title: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }

    /// Parse one raw `[level, title, page]` row.
    ///
    /// Returns `None` for rows with the wrong arity or field types, or a page
    /// number below 1.
    pub fn from_row(row: &Value) -> Option<Self> {
        let fields = row.as_array()?;
        if fields.len() != 3 {
            return None;
        }
        let level = fields[0].as_u64()?;
        let title = fields[1].as_str()?;
        let page = fields[2].as_u64()?;
        if page < 1 {
            return None;
        }
        Some(Self::new(level as usize, title.trim(), page as usize))
    }
}

/// An entry of a document outline as reported by a document reader.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    /// Nesting level, 1-based (top-level outline entries have level 1).
    pub level: usize,
    /// Raw title text.
    pub title: String,
    /// 1-based destination page, if the destination could be resolved.
    pub page: Option<usize>,
}

/// Normalize outline items into TOC entries.
///
/// Items without a resolvable destination page are dropped.
pub fn normalize_outline(items: &[OutlineItem]) -> Vec<TocEntry> {
    items
        .iter()
        .filter_map(|item| match item.page {
            Some(page) if page >= 1 => Some(TocEntry::new(item.level, item.title.trim(), page)),
            _ => {
                tracing::debug!(title = %item.title, "dropping outline item without a destination page");
                None
            }
        })
        .collect()
}

/// Normalize a JSON array of `[level, title, page]` rows into TOC entries.
///
/// Malformed rows are dropped individually. A top-level value that is not an
/// array is an error.
pub fn parse_toc_rows(value: &Value) -> Result<Vec<TocEntry>> {
    let rows = value
        .as_array()
        .ok_or_else(|| Error::MalformedToc("expected an array of [level, title, page] rows".into()))?;

    let mut entries = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match TocEntry::from_row(row) {
            Some(entry) => entries.push(entry),
            None => tracing::debug!(index, %row, "dropping malformed TOC row"),
        }
    }
    Ok(entries)
}
