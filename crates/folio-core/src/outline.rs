//! Outline-to-section-tree construction.
//!
//! Turns a flat, document-ordered list of [`TocEntry`] values into a nested
//! [`Section`] forest. Each entry's provisional end page is the page before
//! the next entry starts; ancestors are then widened so that their span
//! covers every descendant, even when the TOC pages are out of order.

use crate::section::Section;
use crate::toc::TocEntry;

/// Build the section tree for a document with `page_count` pages.
///
/// Uses a single stack-based pass: the stack holds the currently open
/// sections, outermost first. An entry closes every open section whose level
/// is equal or deeper, then opens itself under whatever remains on top.
pub fn build_sections(entries: &[TocEntry], page_count: usize) -> Vec<Section> {
    let mut roots: Vec<Section> = Vec::new();
    let mut stack: Vec<Section> = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let next_page = entries
            .get(index + 1)
            .map_or(page_count + 1, |next| next.page);
        let end_page = entry.page.max(next_page.saturating_sub(1));
        let section = Section::new(entry.title.clone(), entry.level, entry.page, end_page);

        while stack.last().is_some_and(|top| top.level >= section.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(section);
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    roots
}

/// Pop the innermost open section and attach it to its parent (or the roots).
///
/// A section is only closed once all of its children have been closed, so its
/// end page can be widened to cover its last child here.
fn close_top(stack: &mut Vec<Section>, roots: &mut Vec<Section>) {
    let Some(mut section) = stack.pop() else {
        return;
    };
    if let Some(last) = section.children.last() {
        section.end_page = section.end_page.max(last.end_page);
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(section),
        None => roots.push(section),
    }
}
