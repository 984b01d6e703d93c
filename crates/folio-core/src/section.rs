//! Section tree and manifest types.
//!
//! A [`Manifest`] is the persisted outline of a source document: its path,
//! page count, and a tree of [`Section`]s with inclusive page spans. It is the
//! only intermediate representation shared between pipeline stages.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Placeholder slug for titles with no usable characters.
const EMPTY_SLUG: &str = "section";

/// Derive a filesystem-safe slug from a heading title.
///
/// Lower-cases the title, keeps alphanumeric characters, maps whitespace,
/// `:`, `-` and `_` to a hyphen, collapses hyphen runs, and trims hyphens
/// from both ends. Titles that reduce to nothing yield `"section"`.
///
/// ```
/// assert_eq!(
///     folio_core::slugify("The Arkhosian Plains: A Primer"),
///     "the-arkhosian-plains-a-primer"
/// );
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if ch.is_whitespace() || matches!(ch, ':' | '-' | '_') {
            if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// A contiguous page range of the document with a title and nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub title: String,
    pub level: usize,
    /// First page, 1-based.
    pub start_page: usize,
    /// Last page, 1-based and inclusive.
    pub end_page: usize,
    pub slug: String,
    #[serde(default)]
    pub children: Vec<Section>,
}

impl Section {
    /// Create a leaf section, deriving its slug from the title.
    pub fn new(title: impl Into<String>, level: usize, start_page: usize, end_page: usize) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            title,
            level,
            start_page,
            end_page,
            slug,
            children: Vec::new(),
        }
    }

    /// The inclusive range of page numbers this section covers.
    pub fn page_span(&self) -> RangeInclusive<usize> {
        self.start_page..=self.end_page
    }

    /// Find a direct child by exact title.
    pub fn find_child(&self, title: &str) -> Option<&Section> {
        self.children.iter().find(|child| child.title == title)
    }

    /// Whether `other`'s page span lies within this section's page span.
    pub fn contains_span(&self, other: &Section) -> bool {
        self.start_page <= other.start_page && other.end_page <= self.end_page
    }
}

/// Depth-first, pre-order walk over a section forest.
///
/// Each item is a section together with the slugs of its ancestors, ordered
/// root-first.
pub struct SectionIter<'a> {
    stack: Vec<(&'a Section, Vec<&'a str>)>,
}

impl<'a> SectionIter<'a> {
    pub fn new(sections: &'a [Section]) -> Self {
        let stack = sections
            .iter()
            .rev()
            .map(|section| (section, Vec::new()))
            .collect();
        Self { stack }
    }
}

impl<'a> Iterator for SectionIter<'a> {
    type Item = (&'a Section, Vec<&'a str>);

    fn next(&mut self) -> Option<Self::Item> {
        let (section, parents) = self.stack.pop()?;
        for child in section.children.iter().rev() {
            let mut chain = parents.clone();
            chain.push(section.slug.as_str());
            self.stack.push((child, chain));
        }
        Some((section, parents))
    }
}

/// The outline-derived section tree of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub pdf_path: String,
    pub page_count: usize,
    pub sections: Vec<Section>,
}

impl Manifest {
    /// Walk every section, depth-first in document order.
    pub fn iter(&self) -> SectionIter<'_> {
        SectionIter::new(&self.sections)
    }

    /// Check the constraints serde cannot express.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        for (section, _) in self.iter() {
            if section.start_page < 1 {
                return Err(format!(
                    "section '{}': start_page must be >= 1",
                    section.title
                ));
            }
            if section.end_page < 1 {
                return Err(format!(
                    "section '{}': end_page must be >= 1",
                    section.title
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_title_with_colon() {
        assert_eq!(
            slugify("The Arkhosian Plains: A Primer"),
            "the-arkhosian-plains-a-primer"
        );
    }

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slugify("Psionics -- Wild  Talents"), "psionics-wild-talents");
        assert_eq!(slugify("snake_case__title"), "snake-case-title");
    }

    #[test]
    fn slug_trims_hyphens() {
        assert_eq!(slugify(" - Tyr - "), "tyr");
        assert_eq!(slugify(":Defilers:"), "defilers");
    }

    #[test]
    fn slug_drops_punctuation() {
        assert_eq!(slugify("Half-Giants (Optional!)"), "half-giants-optional");
        assert_eq!(slugify("Muls & Thri-kreen"), "muls-thri-kreen");
    }

    #[test]
    fn slug_keeps_unicode_letters() {
        assert_eq!(slugify("Élan Vital"), "élan-vital");
    }

    #[test]
    fn slug_empty_fallback() {
        assert_eq!(slugify(""), "section");
        assert_eq!(slugify("!!! ???"), "section");
        assert_eq!(slugify("---"), "section");
    }

    #[test]
    fn slug_is_deterministic() {
        let title = "Chapter 3: Character Kits";
        assert_eq!(slugify(title), slugify(title));
    }

    #[test]
    fn page_span_is_inclusive() {
        let section = Section::new("History", 2, 2, 4);
        assert_eq!(section.page_span().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn find_child_by_title() {
        let mut parent = Section::new("Intro", 1, 1, 8);
        parent.children.push(Section::new("History", 2, 2, 4));
        parent.children.push(Section::new("Geography", 2, 5, 8));
        assert_eq!(parent.find_child("Geography").unwrap().start_page, 5);
        assert!(parent.find_child("geography").is_none());
    }

    #[test]
    fn iter_is_preorder_with_ancestors() {
        let mut intro = Section::new("Intro", 1, 1, 8);
        let mut history = Section::new("History", 2, 2, 4);
        history.children.push(Section::new("Green Age", 3, 3, 4));
        intro.children.push(history);
        intro.children.push(Section::new("Geography", 2, 5, 8));
        let manifest = Manifest {
            pdf_path: "book.pdf".to_string(),
            page_count: 10,
            sections: vec![intro, Section::new("Appendix", 1, 9, 10)],
        };

        let visited: Vec<(String, Vec<&str>)> = manifest
            .iter()
            .map(|(section, parents)| (section.slug.clone(), parents))
            .collect();
        assert_eq!(
            visited,
            vec![
                ("intro".to_string(), vec![]),
                ("history".to_string(), vec!["intro"]),
                ("green-age".to_string(), vec!["intro", "history"]),
                ("geography".to_string(), vec!["intro"]),
                ("appendix".to_string(), vec![]),
            ]
        );
    }

    #[test]
    fn deserialize_without_children() {
        let json = r#"{"title":"Intro","level":1,"start_page":1,"end_page":2,"slug":"intro"}"#;
        let section: Section = serde_json::from_str(json).unwrap();
        assert!(section.children.is_empty());
    }

    #[test]
    fn deserialize_rejects_extra_fields() {
        let json = r#"{"pdf_path":"a.pdf","page_count":1,"sections":[],"author":"TSR"}"#;
        assert!(serde_json::from_str::<Manifest>(json).is_err());
    }

    #[test]
    fn deserialize_rejects_wrong_types() {
        let json = r#"{"pdf_path":"a.pdf","page_count":"ten","sections":[]}"#;
        assert!(serde_json::from_str::<Manifest>(json).is_err());
    }

    #[test]
    fn validate_rejects_page_zero() {
        let manifest = Manifest {
            pdf_path: "a.pdf".to_string(),
            page_count: 3,
            sections: vec![Section::new("Cover", 1, 0, 1)],
        };
        assert!(manifest.validate().unwrap_err().contains("start_page"));
    }

    #[test]
    fn serialized_key_order() {
        let section = Section::new("Intro", 1, 1, 2);
        let json = serde_json::to_string(&section).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Intro","level":1,"start_page":1,"end_page":2,"slug":"intro","children":[]}"#
        );
    }
}
