use std::path::Path;

use folio::{Manifest, generate_manifest, generate_manifest_from_toc};

use crate::shared::report;

pub fn run(pdf: &Path, output: Option<&Path>, toc: Option<&Path>) -> Result<(), i32> {
    let manifest = match toc {
        Some(toc) => generate_manifest_from_toc(pdf, toc, output),
        None => generate_manifest(pdf, output),
    }
    .map_err(report)?;

    match output {
        Some(path) => println!(
            "Wrote {} ({} sections, {} pages)",
            path.display(),
            section_count(&manifest),
            manifest.page_count
        ),
        None => {
            let json = serde_json::to_string_pretty(&manifest).map_err(|e| report(e.into()))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn section_count(manifest: &Manifest) -> usize {
    manifest.iter().count()
}
