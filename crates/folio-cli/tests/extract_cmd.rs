//! Integration tests for the `extract` subcommand.

#[path = "../../folio-parse/tests/common/mod.rs"]
mod common;

use std::path::Path;

use assert_cmd::Command;
use common::FixturePdf;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("folio").unwrap()
}

fn sourcebook() -> FixturePdf {
    FixturePdf::new()
        .page(vec![vec!["Introduction"]])
        .page(vec![vec!["Player Races"], vec!["Every race has endured."]])
        .page(vec![vec!["HUMAN"], vec!["Humans are versatile."]])
        .outline(1, "Introduction", 1)
        .outline(2, "Player Races", 2)
        .outline(3, "Humans", 3)
}

fn section_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn extract_generates_manifest_and_sections() {
    let pdf = sourcebook().write_temp();
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pdf_manifest.json");
    let sections = dir.path().join("sections");
    cmd()
        .args(["extract", "--pdf", pdf.path().to_str().unwrap()])
        .args(["--manifest", manifest.to_str().unwrap()])
        .args(["--sections-dir", sections.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted 2 sections"));
    assert!(manifest.is_file());
    assert_eq!(
        section_names(&sections),
        vec!["02-002-player-races.json", "03-003-humans.json"]
    );
}

#[test]
fn extract_min_level_and_no_blocks() {
    let pdf = sourcebook().write_temp();
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pdf_manifest.json");
    let sections = dir.path().join("sections");
    cmd()
        .args(["extract", "--pdf", pdf.path().to_str().unwrap()])
        .args(["--manifest", manifest.to_str().unwrap()])
        .args(["--sections-dir", sections.to_str().unwrap()])
        .args(["--min-level", "3", "--no-blocks"])
        .assert()
        .success();
    assert_eq!(section_names(&sections), vec!["03-003-humans.json"]);
    let text = std::fs::read_to_string(sections.join("03-003-humans.json")).unwrap();
    assert!(text.contains("\"parent_slugs\": [\n    \"introduction\",\n    \"player-races\"\n  ]"));
    assert!(!text.contains("\"blocks\""));
}

#[test]
fn extract_skip_extract_only_writes_manifest() {
    let pdf = sourcebook().write_temp();
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pdf_manifest.json");
    let sections = dir.path().join("sections");
    cmd()
        .args(["extract", "--pdf", pdf.path().to_str().unwrap()])
        .args(["--manifest", manifest.to_str().unwrap()])
        .args(["--sections-dir", sections.to_str().unwrap()])
        .arg("--skip-extract")
        .assert()
        .success();
    assert!(manifest.is_file());
    assert!(!sections.exists());
}

#[test]
fn extract_reuses_existing_manifest() {
    let pdf = sourcebook().write_temp();
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pdf_manifest.json");
    let sections = dir.path().join("sections");
    let hand_written = serde_json::json!({
        "pdf_path": pdf.path().to_str().unwrap(),
        "page_count": 3,
        "sections": [{"title": "Only Humans", "level": 2, "start_page": 3, "end_page": 3, "slug": "only-humans"}]
    });
    std::fs::write(&manifest, hand_written.to_string()).unwrap();

    cmd()
        .args(["extract", "--manifest", manifest.to_str().unwrap()])
        .args(["--sections-dir", sections.to_str().unwrap()])
        .assert()
        .success();
    assert_eq!(section_names(&sections), vec!["02-003-only-humans.json"]);

    cmd()
        .args(["extract", "--pdf", pdf.path().to_str().unwrap()])
        .args(["--manifest", manifest.to_str().unwrap()])
        .args(["--sections-dir", sections.to_str().unwrap()])
        .arg("--force-manifest")
        .assert()
        .success();
    assert!(sections.join("02-002-player-races.json").is_file());
}

#[test]
fn extract_without_pdf_or_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pdf_manifest.json");
    cmd()
        .args(["extract", "--manifest", manifest.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--pdf is required"));
}

#[test]
fn extract_missing_pdf_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pdf_manifest.json");
    cmd()
        .args(["extract", "--pdf", "/nonexistent/darksun.pdf"])
        .args(["--manifest", manifest.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("source document not found"));
}

#[test]
fn extract_rejects_malformed_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pdf_manifest.json");
    std::fs::write(&manifest, r#"{"pdf_path": "x.pdf", "page_count": 1}"#).unwrap();
    cmd()
        .args(["extract", "--manifest", manifest.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed manifest"));
}
