//! Transform orchestration: raw section JSON → processed records.
//!
//! A profiles file lists which raw section each transformer consumes:
//!
//! ```json
//! [
//!   {"slug": "player-races", "transformer": "ancestries", "mapping": "races.json"},
//!   {"slug": "the-world-of-athas", "transformer": "journal", "output": "athas.json"}
//! ]
//! ```
//!
//! Transformer keys are resolved when the profiles are loaded, so a typo
//! fails the run before any output is written.

mod ancestry;
mod journal;

use std::fmt;
use std::path::{Path, PathBuf};

use folio_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::extract::RawSection;
use crate::output::{OutputDir, read_json};

pub use ancestry::{
    AncestryCollection, AncestryMetadata, AncestryRecord, AncestryTransformer, Pf2eStats,
};
pub use journal::{JournalEntry, JournalMetadata, JournalTransformer};

/// Maps one raw section plus its mapping configuration to processed data.
pub trait Transformer {
    fn transform(&self, section: &RawSection, mapping: &Value) -> Result<TransformedData>;
}

/// The closed set of transformers a profile may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformerKind {
    Ancestries,
    Journal,
}

impl TransformerKind {
    pub const ALL: [TransformerKind; 2] = [TransformerKind::Ancestries, TransformerKind::Journal];

    /// Look up a transformer by its profile key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            TransformerKind::Ancestries => "ancestries",
            TransformerKind::Journal => "journal",
        }
    }

    pub fn transformer(self) -> &'static dyn Transformer {
        match self {
            TransformerKind::Ancestries => &AncestryTransformer,
            TransformerKind::Journal => &JournalTransformer,
        }
    }
}

impl fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Output of a transformer, one variant per [`TransformerKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransformedData {
    Ancestries(AncestryCollection),
    Journal(JournalEntry),
}

/// A profile as written in the profiles file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileRecord {
    slug: String,
    transformer: String,
    #[serde(default)]
    mapping: Option<PathBuf>,
    #[serde(default)]
    output: Option<String>,
}

/// A validated section profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProfile {
    /// Raw section slug; `*` and `?` act as wildcards.
    pub slug: String,
    pub transformer: TransformerKind,
    /// Mapping file, relative to the profiles file unless absolute.
    pub mapping: Option<PathBuf>,
    /// Output file name; defaults to `<slug>.json`.
    pub output: Option<String>,
}

impl SectionProfile {
    pub fn output_name(&self) -> String {
        self.output
            .clone()
            .unwrap_or_else(|| format!("{}.json", self.slug))
    }
}

/// The file written for each profile.
#[derive(Debug, Serialize)]
struct TransformOutput<'a> {
    slug: &'a str,
    transformer: TransformerKind,
    source_section: &'a str,
    data: TransformedData,
}

/// Load and validate a profiles file.
///
/// # Errors
///
/// [`Error::MalformedProfile`] if the file is not an array of profiles,
/// [`Error::UnknownTransformer`] if any profile names a transformer that does
/// not exist.
pub fn load_profiles(path: &Path) -> Result<Vec<SectionProfile>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let records: Vec<ProfileRecord> = serde_json::from_str(&text)
        .map_err(|e| Error::MalformedProfile(format!("{}: {e}", path.display())))?;

    records
        .into_iter()
        .map(|record| {
            let transformer = TransformerKind::from_key(&record.transformer).ok_or_else(|| {
                Error::UnknownTransformer {
                    key: record.transformer.clone(),
                    slug: record.slug.clone(),
                }
            })?;
            Ok(SectionProfile {
                slug: record.slug,
                transformer,
                mapping: record.mapping,
                output: record.output,
            })
        })
        .collect()
}

/// Find the raw section file for `slug`: the first file (in lexical order)
/// named `*-<slug>.json` in `raw_dir`.
pub fn find_section_file(raw_dir: &Path, slug: &str) -> Result<PathBuf> {
    let not_found = || Error::SectionNotFound {
        slug: slug.to_string(),
        dir: raw_dir.to_path_buf(),
    };
    let pattern = Regex::new(&format!(r"^.*-{}\.json$", glob_to_regex(slug)))
        .map_err(|_| not_found())?;

    let entries = match std::fs::read_dir(raw_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(Error::io(raw_dir, e)),
    };
    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(raw_dir, e))?;
        let name = entry.file_name();
        if name.to_str().is_some_and(|name| pattern.is_match(name)) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    matches.into_iter().next().ok_or_else(not_found)
}

/// Translate a shell-style glob (`*`, `?`) into a regex fragment.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out
}

/// Run every profile in `profiles_path` against the raw sections in
/// `raw_dir`, writing one file per profile into `output_dir`.
pub fn transform_all(profiles_path: &Path, raw_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let profiles = load_profiles(profiles_path)?;
    let out = OutputDir::create(output_dir)?;
    let base = profiles_path.parent().unwrap_or_else(|| Path::new(""));

    let mut written = Vec::with_capacity(profiles.len());
    for profile in &profiles {
        let raw_path = find_section_file(raw_dir, &profile.slug)?;
        let section: RawSection = read_json(&raw_path)?;

        let mapping = match &profile.mapping {
            Some(path) => {
                let path = if path.is_absolute() { path.clone() } else { base.join(path) };
                read_json(&path)?
            }
            None => Value::Object(serde_json::Map::new()),
        };

        let data = profile.transformer.transformer().transform(&section, &mapping)?;
        let payload = TransformOutput {
            slug: &profile.slug,
            transformer: profile.transformer,
            source_section: &section.title,
            data,
        };
        let path = out.write_json(&profile.output_name(), &payload)?;
        debug!(
            slug = %profile.slug,
            transformer = %profile.transformer,
            source = %raw_path.display(),
            path = %path.display(),
            "transformed section"
        );
        written.push(path);
    }
    info!(outputs = written.len(), dir = %out.path().display(), "transform complete");
    Ok(written)
}
