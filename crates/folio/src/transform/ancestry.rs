//! Ancestries transformer: one record per race described in a section.
//!
//! The mapping names each ancestry and carries its game statistics; the
//! description is cut from the section text with the entity window locator.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use folio_core::{EntityDescriptor, Error, Result, locate_windows};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{TransformedData, Transformer};
use crate::extract::RawSection;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

#[derive(Debug, Clone, Copy, Default)]
pub struct AncestryTransformer;

#[derive(Debug, Default, Deserialize)]
struct AncestryMapping {
    #[serde(default)]
    entities: Vec<AncestryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct AncestryEntry {
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    ability_mods: BTreeMap<String, i64>,
    #[serde(default = "default_size")]
    size: String,
    #[serde(default = "default_hit_points")]
    hit_points: u32,
    #[serde(default = "default_speed")]
    speed: u32,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    traits: Vec<String>,
    #[serde(default)]
    heritages: Vec<Value>,
    #[serde(default)]
    features: Vec<Value>,
    #[serde(default)]
    notes: Option<String>,
}

fn default_size() -> String {
    "medium".to_string()
}

fn default_hit_points() -> u32 {
    8
}

fn default_speed() -> u32 {
    25
}

impl AncestryEntry {
    fn descriptor(&self) -> EntityDescriptor {
        EntityDescriptor {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            heading: self.heading.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AncestryCollection {
    pub entities: Vec<AncestryRecord>,
    pub entity_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AncestryRecord {
    pub name: String,
    pub slug: Option<String>,
    pub source_section: String,
    pub source_pages: [usize; 2],
    /// The entity's window with whitespace collapsed; empty if unresolved.
    pub description: String,
    pub pf2e: Pf2eStats,
    pub metadata: AncestryMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pf2eStats {
    pub size: String,
    pub hit_points: u32,
    pub speed: u32,
    pub languages: Vec<String>,
    pub traits: Vec<String>,
    pub boosts: Vec<&'static str>,
    pub flaws: Vec<&'static str>,
    /// Keys lower-cased.
    pub ability_mods: BTreeMap<String, i64>,
    pub heritages: Vec<Value>,
    pub additional_features: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AncestryMetadata {
    pub aliases: Vec<String>,
    pub notes: Option<String>,
}

impl Transformer for AncestryTransformer {
    fn transform(&self, section: &RawSection, mapping: &Value) -> Result<TransformedData> {
        let mapping: AncestryMapping = if mapping.is_null() {
            AncestryMapping::default()
        } else {
            AncestryMapping::deserialize(mapping)
                .map_err(|e| Error::MalformedProfile(format!("ancestries mapping: {e}")))?
        };

        let text = section.normalized_text();
        let descriptors: Vec<EntityDescriptor> =
            mapping.entities.iter().map(AncestryEntry::descriptor).collect();
        let windows = locate_windows(&text, &descriptors);

        let entities = mapping
            .entities
            .into_iter()
            .map(|entry| {
                let excerpt = windows.excerpt(&text, &entry.name).trim();
                let description = WHITESPACE_RUN.replace_all(excerpt, " ").into_owned();
                let ability_mods: BTreeMap<String, i64> = entry
                    .ability_mods
                    .into_iter()
                    .map(|(key, value)| (key.to_lowercase(), value))
                    .collect();
                AncestryRecord {
                    pf2e: Pf2eStats {
                        size: entry.size,
                        hit_points: entry.hit_points,
                        speed: entry.speed,
                        languages: entry.languages,
                        traits: entry.traits,
                        boosts: ability_boosts(&ability_mods),
                        flaws: ability_flaws(&ability_mods),
                        ability_mods,
                        heritages: entry.heritages,
                        additional_features: entry.features,
                    },
                    metadata: AncestryMetadata {
                        aliases: entry.aliases,
                        notes: entry.notes,
                    },
                    name: entry.name,
                    slug: entry.slug,
                    source_section: section.title.clone(),
                    source_pages: [section.start_page, section.end_page],
                    description,
                }
            })
            .collect();

        Ok(TransformedData::Ancestries(AncestryCollection {
            entities,
            entity_type: "ancestry",
        }))
    }
}

fn ability_name(key: &str) -> Option<&'static str> {
    match key {
        "str" => Some("strength"),
        "dex" => Some("dexterity"),
        "con" => Some("constitution"),
        "int" => Some("intelligence"),
        "wis" => Some("wisdom"),
        "cha" => Some("charisma"),
        _ => None,
    }
}

/// Modifiers keyed by a known ability, dropping the rest.
fn known_abilities(mods: &BTreeMap<String, i64>) -> impl Iterator<Item = (&'static str, &str, i64)> {
    mods.iter().filter_map(|(key, &value)| match ability_name(key) {
        Some(name) => Some((name, key.as_str(), value)),
        None => {
            debug!(key = %key, "ignoring unknown ability modifier");
            None
        }
    })
}

/// The two largest positive modifiers (ties broken by key), then a free boost.
fn ability_boosts(mods: &BTreeMap<String, i64>) -> Vec<&'static str> {
    let mut positives: Vec<(&'static str, &str, i64)> =
        known_abilities(mods).filter(|&(_, _, value)| value > 0).collect();
    positives.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(b.1)));
    let mut boosts: Vec<&'static str> = positives.into_iter().take(2).map(|(name, _, _)| name).collect();
    boosts.push("free");
    boosts
}

/// Every ability sharing the most negative modifier.
fn ability_flaws(mods: &BTreeMap<String, i64>) -> Vec<&'static str> {
    let negatives: Vec<(&'static str, i64)> = known_abilities(mods)
        .filter(|&(_, _, value)| value < 0)
        .map(|(name, _, value)| (name, value))
        .collect();
    let Some(worst) = negatives.iter().map(|&(_, value)| value).min() else {
        return Vec::new();
    };
    negatives
        .into_iter()
        .filter(|&(_, value)| value == worst)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawPage;
    use serde_json::json;

    fn races() -> RawSection {
        RawSection {
            title: "Player Character Races".to_string(),
            slug: "player-character-races".to_string(),
            level: 2,
            start_page: 14,
            end_page: 15,
            parent_slugs: vec!["character-creation".to_string()],
            pages: vec![
                RawPage {
                    page_number: 14,
                    text: "\n\nHUMAN\nHumans are   versatile.\n\nELF\nElves are grace-\nful runners.\n"
                        .to_string(),
                    blocks: None,
                },
                RawPage {
                    page_number: 15,
                    text: "MUL\nMuls are tireless.".to_string(),
                    blocks: None,
                },
            ],
        }
    }

    fn run(mapping: Value) -> AncestryCollection {
        match AncestryTransformer.transform(&races(), &mapping).unwrap() {
            TransformedData::Ancestries(collection) => collection,
            other => panic!("unexpected output {other:?}"),
        }
    }

    fn mods(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn descriptions_come_from_windows() {
        let collection = run(json!({"entities": [
            {"name": "Human"},
            {"name": "Elf"},
            {"name": "Mul"}
        ]}));
        let descriptions: Vec<&str> = collection
            .entities
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "HUMAN Humans are versatile.",
                "ELF Elves are graceful runners.",
                "MUL Muls are tireless.",
            ]
        );
        assert_eq!(collection.entity_type, "ancestry");
    }

    #[test]
    fn unresolved_entity_gets_empty_description() {
        let collection = run(json!({"entities": [{"name": "Thri-kreen"}, {"name": "Elf"}]}));
        assert_eq!(collection.entities[0].description, "");
        assert!(collection.entities[1].description.starts_with("ELF"));
    }

    #[test]
    fn defaults_and_passthrough() {
        let collection = run(json!({"entities": [{
            "name": "Mul",
            "slug": "mul",
            "aliases": ["Muls"],
            "languages": ["Common"],
            "notes": "Half-dwarf"
        }]}));
        let mul = &collection.entities[0];
        assert_eq!(mul.slug.as_deref(), Some("mul"));
        assert_eq!(mul.source_section, "Player Character Races");
        assert_eq!(mul.source_pages, [14, 15]);
        assert_eq!(mul.pf2e.size, "medium");
        assert_eq!(mul.pf2e.hit_points, 8);
        assert_eq!(mul.pf2e.speed, 25);
        assert_eq!(mul.pf2e.languages, vec!["Common"]);
        assert_eq!(mul.metadata.aliases, vec!["Muls"]);
        assert_eq!(mul.metadata.notes.as_deref(), Some("Half-dwarf"));
    }

    #[test]
    fn ability_mod_keys_lowercased() {
        let collection = run(json!({"entities": [
            {"name": "Mul", "ability_mods": {"STR": 2, "Con": 1, "int": -1, "cha": -1}}
        ]}));
        let pf2e = &collection.entities[0].pf2e;
        assert_eq!(pf2e.ability_mods, mods(&[("str", 2), ("con", 1), ("int", -1), ("cha", -1)]));
        assert_eq!(pf2e.boosts, vec!["strength", "constitution", "free"]);
        assert_eq!(pf2e.flaws, vec!["charisma", "intelligence"]);
    }

    #[test]
    fn boosts_sorted_by_value_then_key() {
        let boosts = ability_boosts(&mods(&[("wis", 1), ("dex", 2), ("cha", 1)]));
        assert_eq!(boosts, vec!["dexterity", "charisma", "free"]);
    }

    #[test]
    fn single_or_no_boost_adds_free() {
        assert_eq!(ability_boosts(&mods(&[("dex", 2)])), vec!["dexterity", "free"]);
        assert_eq!(ability_boosts(&mods(&[])), vec!["free"]);
    }

    #[test]
    fn flaws_only_the_worst_penalty() {
        let flaws = ability_flaws(&mods(&[("str", -2), ("wis", -1), ("cha", -2)]));
        assert_eq!(flaws, vec!["charisma", "strength"]);
        assert!(ability_flaws(&mods(&[("str", 1)])).is_empty());
    }

    #[test]
    fn unknown_ability_keys_ignored() {
        let boosts = ability_boosts(&mods(&[("luck", 5), ("str", 1)]));
        assert_eq!(boosts, vec!["strength", "free"]);
    }

    #[test]
    fn empty_or_null_mapping() {
        assert!(run(json!({})).entities.is_empty());
        assert!(run(Value::Null).entities.is_empty());
    }

    #[test]
    fn malformed_mapping() {
        let err = AncestryTransformer
            .transform(&races(), &json!({"entities": [{"aliases": ["x"]}]}))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedProfile(_)));
    }

    #[test]
    fn serialized_key_order() {
        let data = AncestryTransformer
            .transform(&races(), &json!({"entities": [{"name": "Elf"}]}))
            .unwrap();
        let text = serde_json::to_string(&data).unwrap();
        assert!(text.starts_with(r#"{"entities":[{"name":"Elf","slug":null"#));
        assert!(text.ends_with(r#""entity_type":"ancestry"}"#));
    }
}
