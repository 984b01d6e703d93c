use std::path::Path;

use folio::{ExtractOptions, extract_sections, generate_manifest, load_manifest};

use crate::shared::report;

pub struct ExtractArgs<'a> {
    pub pdf: Option<&'a Path>,
    pub manifest: &'a Path,
    pub sections_dir: &'a Path,
    pub min_level: usize,
    pub force_manifest: bool,
    pub skip_extract: bool,
    pub include_blocks: bool,
}

pub fn run(args: &ExtractArgs<'_>) -> Result<(), i32> {
    let manifest = if args.manifest.exists() && !args.force_manifest {
        tracing::info!(path = %args.manifest.display(), "reusing existing manifest");
        load_manifest(args.manifest).map_err(report)?
    } else {
        let Some(pdf) = args.pdf else {
            eprintln!(
                "Error: --pdf is required to generate {}",
                args.manifest.display()
            );
            return Err(1);
        };
        generate_manifest(pdf, Some(args.manifest)).map_err(report)?
    };

    if args.skip_extract {
        return Ok(());
    }

    let options = ExtractOptions {
        min_level: args.min_level,
        include_blocks: args.include_blocks,
    };
    let written = extract_sections(&manifest, args.sections_dir, &options).map_err(report)?;
    println!(
        "Extracted {} sections to {}",
        written.len(),
        args.sections_dir.display()
    );

    Ok(())
}
