//! Page text normalization shared by the window locator and transformers.
//!
//! Normalization replaces carriage returns with newlines, rejoins words split
//! by a hyphen at a line break, and canonicalizes paragraph breaks so that a
//! blank line (exactly two newlines) is the only paragraph separator.

use std::sync::LazyLock;

use regex::Regex;

static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\n\s*").expect("hyphen break pattern"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline run pattern"));
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph break pattern"));

/// Normalize the text of a single page.
///
/// Carriage returns become newlines and hyphenated line breaks are removed
/// together with any whitespace that follows them.
pub fn normalize_page_text(text: &str) -> String {
    let text = text.replace('\r', "\n");
    HYPHEN_BREAK.replace_all(&text, "").into_owned()
}

/// Normalize and join the text of consecutive pages.
///
/// Pages are joined with a newline; runs of three or more newlines collapse
/// to exactly two.
pub fn normalize_pages<'a, I>(pages: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let combined = pages
        .into_iter()
        .map(normalize_page_text)
        .collect::<Vec<_>>()
        .join("\n");
    EXCESS_NEWLINES.replace_all(&combined, "\n\n").into_owned()
}

/// Split text into paragraphs at runs of two or more newlines.
///
/// Returns `(start_offset, paragraph)` pairs in order. Offsets are byte
/// offsets into `text`. Empty paragraphs (leading or trailing breaks) are
/// kept so that offsets stay aligned with the source.
pub fn split_paragraphs(text: &str) -> Vec<(usize, &str)> {
    let mut paragraphs = Vec::new();
    let mut cursor = 0;
    for brk in PARAGRAPH_BREAK.find_iter(text) {
        paragraphs.push((cursor, &text[cursor..brk.start()]));
        cursor = brk.end();
    }
    paragraphs.push((cursor, &text[cursor..]));
    paragraphs
}
