//! Entity window location.
//!
//! Given the normalized text of one section and a list of named entities,
//! finds where each entity's own prose begins and assigns it the span up to
//! the next located entity. Location is a deterministic two-phase heuristic:
//!
//! 1. **Heading match**: the first non-empty line of each paragraph is
//!    compared (case-insensitively) with each entity's heading hint, then
//!    with its aliases (the entity name is always an alias).
//! 2. **Literal search**: entities still unplaced are searched for in the
//!    whole text using three progressively looser patterns: the string alone
//!    on its own line, the string as a whole word at the start of a line, and
//!    the string as a whole word anywhere.
//!
//! Entities found by neither phase get the empty window `(0, 0)`.
//!
//! All offsets are byte offsets into the text and always fall on character
//! boundaries.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::split_paragraphs;

/// A named entity whose description should be located in section text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Unique name; also an implicit alias.
    pub name: String,
    /// Alternative spellings, tried in order during literal search.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Exact heading text expected above the entity's description.
    #[serde(default)]
    pub heading: Option<String>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    /// Strings tried during literal search: heading hint, aliases, then name.
    fn search_values(&self) -> impl Iterator<Item = (&str, bool)> {
        self.heading
            .as_deref()
            .map(|hint| (hint, true))
            .into_iter()
            .chain(self.aliases.iter().map(|alias| (alias.as_str(), false)))
            .chain(std::iter::once((self.name.as_str(), false)))
    }
}

/// Case-folded matching data for one entity.
struct HeadingMatcher {
    heading: Option<String>,
    aliases: HashSet<String>,
}

impl HeadingMatcher {
    fn new(entity: &EntityDescriptor) -> Self {
        let aliases = entity
            .aliases
            .iter()
            .chain(std::iter::once(&entity.name))
            .map(|alias| alias.to_lowercase())
            .collect();
        Self {
            heading: entity.heading.as_ref().map(|h| h.to_lowercase()),
            aliases,
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        self.heading.as_deref() == Some(candidate) || self.aliases.contains(candidate)
    }
}

/// The located windows for a set of entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityWindows {
    spans: HashMap<String, (usize, usize)>,
    located: Vec<String>,
    unresolved: Vec<String>,
}

impl EntityWindows {
    /// The `[start, end)` span for `name`; `(0, 0)` if it was never located.
    pub fn span(&self, name: &str) -> (usize, usize) {
        self.spans.get(name).copied().unwrap_or((0, 0))
    }

    /// The slice of `text` covered by `name`'s window.
    pub fn excerpt<'t>(&self, text: &'t str, name: &str) -> &'t str {
        let (start, end) = self.span(name);
        text.get(start..end).unwrap_or("")
    }

    /// Names of located entities in text order.
    pub fn located(&self) -> &[String] {
        &self.located
    }

    /// Names of entities that could not be located, in input order.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}

/// Locate the text window of every entity in `text`.
pub fn locate_windows(text: &str, entities: &[EntityDescriptor]) -> EntityWindows {
    let matchers: Vec<HeadingMatcher> = entities.iter().map(HeadingMatcher::new).collect();
    let mut placed = vec![false; entities.len()];
    let mut positions: Vec<(usize, usize)> = Vec::new();

    for (start, paragraph) in split_paragraphs(text) {
        let Some(first_line) = paragraph.lines().map(str::trim).find(|line| !line.is_empty())
        else {
            continue;
        };
        let candidate = first_line.to_lowercase();
        let hit = matchers
            .iter()
            .enumerate()
            .find(|(index, matcher)| !placed[*index] && matcher.matches(&candidate));
        if let Some((index, _)) = hit {
            placed[index] = true;
            positions.push((index, start));
        }
    }

    for (index, entity) in entities.iter().enumerate() {
        if placed[index] {
            continue;
        }
        let mut best: Option<usize> = None;
        for (value, is_hint) in entity.search_values() {
            if let Some(offset) = locate_literal(text, value) {
                best = Some(best.map_or(offset, |current| current.min(offset)));
                if is_hint {
                    break;
                }
            }
        }
        if let Some(offset) = best {
            placed[index] = true;
            positions.push((index, offset));
        }
    }

    // Stable: entities sharing an offset keep their discovery order.
    positions.sort_by_key(|&(_, offset)| offset);

    let mut windows = EntityWindows::default();
    for (rank, &(index, start)) in positions.iter().enumerate() {
        let end = positions
            .get(rank + 1)
            .map_or(text.len(), |&(_, next)| next);
        let name = entities[index].name.clone();
        windows.spans.insert(name.clone(), (start, end));
        windows.located.push(name);
    }
    for (index, entity) in entities.iter().enumerate() {
        if !placed[index] {
            tracing::warn!(entity = %entity.name, "no heading or alias found; window is empty");
            windows.unresolved.push(entity.name.clone());
        }
    }
    windows
}

/// Find the offset of `value` in `text` using the three search tiers.
///
/// Matching is case-insensitive. Returns the earliest match of the first tier
/// that matches at all.
fn locate_literal(text: &str, value: &str) -> Option<usize> {
    if value.is_empty() {
        return None;
    }
    let escaped = regex::escape(value);

    if let Some(found) = search(&format!(r"(?i)\n{escaped}\n"), text) {
        return Some(found.start() + 1);
    }
    if let Some(found) = search(&format!(r"(?i)(?:^|\n){escaped}\b"), text) {
        let skip = usize::from(found.as_str().starts_with('\n'));
        return Some(found.start() + skip);
    }
    search(&format!(r"(?i)\b{escaped}\b"), text).map(|found| found.start())
}

fn search<'t>(pattern: &str, text: &'t str) -> Option<regex::Match<'t>> {
    match Regex::new(pattern) {
        Ok(re) => re.find(text),
        Err(err) => {
            tracing::debug!(%pattern, %err, "skipping unusable search pattern");
            None
        }
    }
}
