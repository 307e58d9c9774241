//! axtsplit - split AXT alignments at long gap runs
//!
//! ## Usage
//!
//! ```bash
//! axtsplit <min_gap> <input.axt> [output.axt]
//! axtsplit 10 chains.axt split.axt
//! zcat chains.axt.gz | axtsplit -t 8 10 - > split.axt
//! ```
//!
//! Every alignment block is cut at each gap run of at least `min_gap`
//! columns (on either row). The pieces are written as AXT blocks numbered
//! from 0 across the whole output.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use axtsplit::formats::is_stdio;
use axtsplit::pipeline::split_file;
use axtsplit::split::SplitOptions;

/// axtsplit - split pairwise AXT alignments at long gap runs
///
/// Coordinates of every piece are recomputed on the reference and on the
/// query, including reverse-strand queries.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Minimum gap-run length (in columns) that splits an alignment
    #[arg(value_name = "MIN_GAP")]
    min_gap: NonZeroUsize,

    /// AXT file to split. Use "-" for stdin.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file. Use "-" for stdout.
    #[arg(value_name = "OUTPUT", default_value = "-")]
    output: PathBuf,

    /// Gap symbol used in the aligned sequences
    #[arg(long = "gap-char", default_value_t = '-')]
    gap_char: char,

    /// Number of worker threads (1 = sequential)
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    threads: usize,

    /// Records split together per parallel batch
    #[arg(long = "batch-size", default_value = "1024")]
    batch_size: NonZeroUsize,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp(None)
        .format_target(false)
        .init();

    if !args.gap_char.is_ascii() || args.gap_char.is_ascii_whitespace() {
        anyhow::bail!("Gap symbol must be a printable ASCII character (got {:?})", args.gap_char);
    }
    if args.threads == 0 {
        anyhow::bail!("Thread count must be at least 1");
    }

    if args.threads > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("Failed to start worker threads")?;
        log::debug!("Using {} worker threads", rayon::current_num_threads());
    }

    let options = SplitOptions::new(args.min_gap).with_gap(args.gap_char as u8);
    log::info!(
        "Splitting {} at gap runs of >= {} columns",
        args.input.display(),
        options.min_gap
    );

    let summary = match split_file(
        &args.input,
        &args.output,
        &options,
        args.threads,
        args.batch_size,
    ) {
        Ok(summary) => summary,
        Err(e) => {
            if e.is_parse_error() {
                log::error!("Input is not well-formed AXT; stopping before the faulty block");
            }
            return Err(e).with_context(|| format!("Failed to split {}", args.input.display()));
        }
    };

    let destination = if is_stdio(&args.output) {
        "stdout".to_string()
    } else {
        args.output.display().to_string()
    };
    log::info!(
        "Wrote {} sub-alignments from {} records to {}",
        summary.sub_alignments,
        summary.records,
        destination
    );

    Ok(())
}
