//! thmerge - stitch two fingerprint segments together
//!
//! Usage: thmerge <left_file> <right_file> [--output FILE]
//!
//! Merges the first segment of each file. A refused merge is reported in the
//! JSON output and is not an error.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use timedhash_cli::output::{print_json, WindowSummary};
use timedhash_core::{
    storage_backend::document_from_segments, SegmentMerger, TimedHashConfig, TimedHashes,
};

#[derive(Parser, Debug)]
#[command(name = "thmerge")]
#[command(about = "Merge two timed fingerprint segments", long_about = None)]
struct Args {
    /// Segment file holding the earlier segment
    left: PathBuf,

    /// Segment file holding the later segment
    right: PathBuf,

    /// Write the merged segment here (.th, .json or .bson)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    timedhash_cli::init_logging(args.verbose);

    run_thmerge(&args)
}

fn run_thmerge(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => TimedHashConfig::load(path)?,
        None => TimedHashConfig::default(),
    };

    let left = first_segment(&args.left)?;
    let right = first_segment(&args.right)?;

    log::info!(
        "Merging {} records at {} with {} records at {}",
        left.len(),
        left.starts_at(),
        right.len(),
        right.starts_at()
    );

    let merger = SegmentMerger::new(&config.timing);
    let result = match merger.try_merge(&left, &right) {
        Ok(merged) => {
            let mut result = serde_json::json!({
                "merged": true,
                "segment": WindowSummary::new(0, &merged, &config.timing),
            });

            if let Some(output) = &args.output {
                let stream_id = output
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("merged");
                document_from_segments(stream_id, std::slice::from_ref(&merged))
                    .save_auto(output, config.storage.compress)?;
                result["output_file"] = output.display().to_string().into();
            }

            result
        }
        Err(reason) => {
            log::info!("Merge refused: {}", reason);
            serde_json::json!({
                "merged": false,
                "reason": reason.to_string(),
            })
        }
    };

    print_json(&result);

    Ok(())
}

fn first_segment(path: &Path) -> Result<TimedHashes> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    timedhash_core::load_segments(path)?
        .into_iter()
        .next()
        .with_context(|| format!("No segments in {}", path.display()))
}
