//! thaggregate - consolidate fingerprint segments into fixed-length windows
//!
//! Usage: thaggregate <segment_file>... [--output DIR] [--config FILE]

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use timedhash_cli::output::{print_json, AggregateOutput};
use timedhash_core::{
    FileFormat, FilesystemStore, SegmentStore, TimedHashConfig, TimedHashes, WindowAggregator,
};

#[derive(Parser, Debug)]
#[command(name = "thaggregate")]
#[command(about = "Aggregate timed fingerprint segments into windows", long_about = None)]
struct Args {
    /// Segment files (.th, .json or .bson)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory for the windows file (defaults to storage.base_directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stream identifier (defaults to the first input's file stem)
    #[arg(long)]
    stream_id: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target window length in seconds
    #[arg(short, long)]
    target_length: Option<f64>,

    /// Keep empty placeholder windows in the output
    #[arg(long)]
    keep_empty: bool,

    /// Output format: binary, json, bson or auto
    #[arg(short, long)]
    format: Option<FileFormat>,

    /// Do not write the windows file, only print the summary
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    timedhash_cli::init_logging(args.verbose);

    run_thaggregate(args).await
}

async fn run_thaggregate(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    let stream_id = match &args.stream_id {
        Some(id) => id.clone(),
        None => stream_id_from_path(&args.inputs[0])?,
    };

    let start = std::time::Instant::now();
    let segments = load_inputs(&args.inputs)?;
    log::info!(
        "Loaded {} segments ({} records) in {:.2}s",
        segments.len(),
        segments.iter().map(|s| s.len()).sum::<usize>(),
        start.elapsed().as_secs_f64()
    );

    let aggregator = WindowAggregator::new(&config.timing, &config.windowing);
    let windows = aggregator.aggregate(segments.clone());

    let mut output = AggregateOutput::new(
        stream_id.clone(),
        &segments,
        &windows,
        &config.timing,
        config.windowing.target_length_s,
    );

    if !args.dry_run {
        let store = FilesystemStore::new(&config.storage);
        store
            .save_windows(&stream_id, &windows)
            .await
            .with_context(|| format!("Failed to save windows for stream {}", stream_id))?;

        output.output_file = Some(store.windows_path(&stream_id).display().to_string());
    }

    print_json(&output);

    Ok(())
}

/// Configuration file (or defaults) with command line overrides applied
fn load_config(args: &Args) -> Result<TimedHashConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            TimedHashConfig::load(path)?
        }
        None => TimedHashConfig::default(),
    };

    if let Some(target_length) = args.target_length {
        config.windowing.target_length_s = target_length;
    }
    if args.keep_empty {
        config.windowing.keep_empty_windows = true;
    }
    if let Some(format) = args.format {
        config.storage.format = format;
    }
    if let Some(output) = &args.output {
        config.storage.base_directory = output.display().to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Load every input file in parallel, keeping input order
fn load_inputs(inputs: &[PathBuf]) -> Result<Vec<TimedHashes>> {
    for path in inputs {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
    }

    let loaded: Vec<Vec<TimedHashes>> = inputs
        .par_iter()
        .map(|path| {
            log::debug!("Loading: {}", path.display());
            timedhash_core::load_segments(path)
        })
        .collect::<Result<_>>()?;

    Ok(loaded.into_iter().flatten().collect())
}

fn stream_id_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .with_context(|| format!("Cannot derive a stream id from {}", path.display()))
}
