use std::path::Path;

use folio::folio_core::{OutlineItem, normalize_outline};
use folio::PageSource;

use crate::cli::TocFormat;
use crate::shared::{open_pdf, report};

pub fn run(file: &Path, format: TocFormat) -> Result<(), i32> {
    let source = open_pdf(file)?;
    let outline = source.outline().map_err(report)?;

    match format {
        TocFormat::Text => write_text(&outline),
        TocFormat::Json => write_json(&outline),
    }
}

fn write_text(outline: &[OutlineItem]) -> Result<(), i32> {
    if outline.is_empty() {
        println!("No outline found.");
        return Ok(());
    }

    println!("level\tpage\ttitle");

    for item in outline {
        let indent = "  ".repeat(item.level.saturating_sub(1));
        let page = match item.page {
            Some(p) => p.to_string(),
            None => "-".to_string(),
        };
        println!("{}\t{}\t{}{}", item.level, page, indent, item.title.trim());
    }

    Ok(())
}

/// Rows in the `[level, title, page]` shape `manifest --toc` reads back.
fn write_json(outline: &[OutlineItem]) -> Result<(), i32> {
    let rows: Vec<serde_json::Value> = normalize_outline(outline)
        .into_iter()
        .map(|entry| serde_json::json!([entry.level, entry.title, entry.page]))
        .collect();

    let json = serde_json::to_string_pretty(&rows).map_err(|e| report(e.into()))?;
    println!("{json}");

    Ok(())
}
