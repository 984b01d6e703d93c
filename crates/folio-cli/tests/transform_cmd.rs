//! Integration tests for the `transform` subcommand.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("folio").unwrap()
}

const RACES: &str = r#"{
  "title": "Player Races",
  "slug": "player-races",
  "level": 2,
  "start_page": 14,
  "end_page": 14,
  "parent_slugs": ["introduction"],
  "pages": [{"page_number": 14, "text": "HUMAN\nHumans are versatile.\n\nELF\nElves are graceful.\n"}]
}"#;

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join("02-014-player-races.json"), RACES).unwrap();
    let mappings = dir.path().join("mappings");
    fs::create_dir_all(&mappings).unwrap();
    fs::write(
        mappings.join("races.json"),
        r#"{"entities": [{"name": "Human"}, {"name": "Elf", "ability_mods": {"dex": 2, "con": -1}}]}"#,
    )
    .unwrap();
    dir
}

#[test]
fn transform_writes_processed_files() {
    let dir = workspace();
    let profiles = dir.path().join("mappings").join("section_profiles.json");
    fs::write(
        &profiles,
        r#"[{"slug": "player-races", "transformer": "ancestries", "mapping": "races.json"},
            {"slug": "player-*", "transformer": "journal", "output": "races-journal.json"}]"#,
    )
    .unwrap();
    let out = dir.path().join("processed");

    cmd()
        .args(["transform", "--profiles", profiles.to_str().unwrap()])
        .args(["--raw-dir", dir.path().join("raw").to_str().unwrap()])
        .args(["--output-dir", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("player-races.json"))
        .stdout(predicate::str::contains("races-journal.json"));

    let races: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("player-races.json")).unwrap()).unwrap();
    assert_eq!(races["source_section"], "Player Races");
    let elf = &races["data"]["entities"][1];
    assert_eq!(elf["description"], "ELF Elves are graceful.");
    assert_eq!(elf["pf2e"]["boosts"], serde_json::json!(["dexterity", "free"]));
    assert_eq!(elf["pf2e"]["flaws"], serde_json::json!(["constitution"]));

    let journal: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("races-journal.json")).unwrap()).unwrap();
    assert_eq!(journal["transformer"], "journal");
    assert_eq!(journal["data"]["source_pages"], serde_json::json!([14, 14]));
}

#[test]
fn unknown_transformer_fails() {
    let dir = workspace();
    let profiles = dir.path().join("profiles.json");
    fs::write(&profiles, r#"[{"slug": "player-races", "transformer": "monsters"}]"#).unwrap();
    cmd()
        .args(["transform", "--profiles", profiles.to_str().unwrap()])
        .args(["--raw-dir", dir.path().join("raw").to_str().unwrap()])
        .args(["--output-dir", dir.path().join("processed").to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "unknown transformer 'monsters' for slug 'player-races'",
        ));
}

#[test]
fn missing_section_fails() {
    let dir = workspace();
    let profiles = dir.path().join("profiles.json");
    fs::write(&profiles, r#"[{"slug": "psionics", "transformer": "journal"}]"#).unwrap();
    cmd()
        .args(["transform", "--profiles", profiles.to_str().unwrap()])
        .args(["--raw-dir", dir.path().join("raw").to_str().unwrap()])
        .args(["--output-dir", dir.path().join("processed").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no raw section file found for slug 'psionics'"));
}
