// Batch compiler: reference CSV directory -> one JSON artifact
//
// Usage: tcg-compile [--config FILE] [--source-dir DIR] [--output FILE]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tcg_collector::{compile_to, Config, Overrides};

/// Default output when neither the config nor --output names one
const DEFAULT_OUTPUT: &str = "data/compiled_cards.json";

#[derive(Parser, Debug)]
#[command(name = "tcg-compile", version, about = "Compile reference CSVs into one artifact")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of reference CSV files
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Artifact to write
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::resolve(
        args.config.as_deref(),
        Overrides {
            reference_dir: args.source_dir,
            ..Default::default()
        },
    )?;

    let output = args
        .output
        .or_else(|| config.artifact_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    println!("📂 Compiling {}...", config.reference_dir.display());

    let artifact = compile_to(&config.reference_dir, &output).with_context(|| {
        format!(
            "Compilation of {} failed",
            config.reference_dir.display()
        )
    })?;

    println!(
        "✓ {} cards from {} files → {}",
        artifact.cards.len(),
        artifact.source_files.len(),
        output.display()
    );

    Ok(())
}
