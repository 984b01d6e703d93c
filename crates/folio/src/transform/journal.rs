//! Journal transformer: a section's prose as HTML paragraphs.

use folio_core::{Result, split_paragraphs};
use serde::Serialize;
use serde_json::Value;

use super::{TransformedData, Transformer};
use crate::extract::RawSection;

#[derive(Debug, Clone, Copy, Default)]
pub struct JournalTransformer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub entity_type: &'static str,
    pub slug: String,
    pub title: String,
    /// `<p>` elements separated by newlines.
    pub content: String,
    pub source_pages: [usize; 2],
    pub metadata: JournalMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalMetadata {
    pub parent_slugs: Vec<String>,
    pub level: usize,
}

impl Transformer for JournalTransformer {
    fn transform(&self, section: &RawSection, _mapping: &Value) -> Result<TransformedData> {
        let text = section.normalized_text();
        Ok(TransformedData::Journal(JournalEntry {
            entity_type: "journal",
            slug: section.slug.clone(),
            title: section.title.clone(),
            content: to_html(text.trim()),
            source_pages: [section.start_page, section.end_page],
            metadata: JournalMetadata {
                parent_slugs: section.parent_slugs.clone(),
                level: section.level,
            },
        }))
    }
}

fn to_html(text: &str) -> String {
    let paragraphs: Vec<String> = split_paragraphs(text)
        .into_iter()
        .map(|(_, paragraph)| paragraph.trim())
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| format!("<p>{paragraph}</p>"))
        .collect();
    if paragraphs.is_empty() {
        return "<p></p>".to_string();
    }
    paragraphs.join("\n")
}
