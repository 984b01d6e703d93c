use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Split an outlined PDF sourcebook into section JSON and processed records.
#[derive(Debug, Parser)]
#[command(name = "folio", about, version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the table of contents derived from the PDF outline
    Toc {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = TocFormat::Text)]
        format: TocFormat,
    },

    /// Build the section manifest for a PDF
    Manifest {
        /// Path to the PDF file
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        /// Write the manifest here instead of printing it
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Use a JSON file of [level, title, page] rows instead of the outline
        #[arg(long, value_name = "FILE")]
        toc: Option<PathBuf>,
    },

    /// Generate (or reuse) the manifest and extract per-section JSON
    Extract {
        /// Path to the source PDF (needed when the manifest must be generated)
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Where to write/read the manifest JSON
        #[arg(long, default_value = "data/raw/pdf_manifest.json")]
        manifest: PathBuf,

        /// Directory to write extracted section JSON files
        #[arg(long, default_value = "data/raw/sections")]
        sections_dir: PathBuf,

        /// Minimum outline level to extract
        #[arg(long, default_value_t = 2)]
        min_level: usize,

        /// Regenerate the manifest even if it already exists
        #[arg(long)]
        force_manifest: bool,

        /// Only generate the manifest without extracting sections
        #[arg(long)]
        skip_extract: bool,

        /// Do not include positional text blocks in section files
        #[arg(long)]
        no_blocks: bool,
    },

    /// Run section profiles over raw sections to produce processed records
    Transform {
        /// Path to the section profile configuration JSON
        #[arg(long, default_value = "data/mappings/section_profiles.json")]
        profiles: PathBuf,

        /// Directory containing raw section JSON files
        #[arg(long, default_value = "data/raw/sections")]
        raw_dir: PathBuf,

        /// Directory to write processed data
        #[arg(long, default_value = "data/processed")]
        output_dir: PathBuf,
    },
}

/// Output format for the `toc` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TocFormat {
    Text,
    Json,
}
