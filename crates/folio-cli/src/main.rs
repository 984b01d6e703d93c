mod cli;
mod extract_cmd;
mod manifest_cmd;
mod shared;
mod toc_cmd;
mod transform_cmd;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    shared::init_tracing(cli.verbose);

    let result = match cli.command {
        cli::Commands::Toc { ref file, format } => toc_cmd::run(file, format),
        cli::Commands::Manifest {
            ref pdf,
            ref output,
            ref toc,
        } => manifest_cmd::run(pdf, output.as_deref(), toc.as_deref()),
        cli::Commands::Extract {
            ref pdf,
            ref manifest,
            ref sections_dir,
            min_level,
            force_manifest,
            skip_extract,
            no_blocks,
        } => extract_cmd::run(&extract_cmd::ExtractArgs {
            pdf: pdf.as_deref(),
            manifest,
            sections_dir,
            min_level,
            force_manifest,
            skip_extract,
            include_blocks: !no_blocks,
        }),
        cli::Commands::Transform {
            ref profiles,
            ref raw_dir,
            ref output_dir,
        } => transform_cmd::run(profiles, raw_dir, output_dir),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
