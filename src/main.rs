use std::fs::File;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use tracing_subscriber::EnvFilter;

use heavytop::{Config, HeavyKeeper};

/// Print the most frequent words read from stdin or a file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of top words to report
    k: usize,

    /// Buckets per sketch row
    width: usize,

    /// Number of sketch rows
    depth: usize,

    /// Conflict decay factor, between 0 and 1
    decay: f64,

    /// Read words from this file instead of stdin
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Minimum estimate before a word is tracked
    #[arg(long, default_value_t = 0)]
    min_count: u32,

    /// Fade all counters by this factor every `--fading-interval-ms`
    #[arg(long)]
    fading_factor: Option<u32>,

    #[arg(long, default_value_t = 1000)]
    fading_interval_ms: u64,

    /// Print keys as they are expelled from the top-k set
    #[arg(long)]
    show_expelled: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::new(args.k, args.width, args.depth, args.decay)
        .with_min_count(args.min_count);
    if let Some(factor) = args.fading_factor {
        config = config.with_fading(true, factor, Duration::from_millis(args.fading_interval_ms));
    }
    let topk = HeavyKeeper::new(config).context("invalid configuration")?;
    let expelled = topk.expelled();

    let add_words = |line: &str| {
        for word in line.split_whitespace() {
            topk.add(word, 1);
        }
        if args.show_expelled {
            for node in expelled.try_iter() {
                eprintln!("expelled {} {}", node.key, node.count);
            }
        }
    };

    match &args.file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            // SAFETY: the mapping is only read, and the input file is not
            // expected to change while we scan it.
            let mmap = unsafe { Mmap::map(&file) }
                .with_context(|| format!("failed to map {}", path.display()))?;
            for line in String::from_utf8_lossy(&mmap).lines() {
                add_words(line);
            }
        }
        None => {
            for line in io::stdin().lock().lines() {
                add_words(&line.context("failed to read stdin")?);
            }
        }
    }

    for node in topk.list() {
        println!("{} {}", node.key, node.count);
    }
    Ok(())
}
