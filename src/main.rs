use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use seqplug::{
    cache::CacheStore, kmer, report::ResultMap, InputPolicy, MotifSearch, Pipeline, PipelineSpec,
    RecordReader, Registered,
};

/// Run the analyzer pipeline and the cached k-mer enumeration over a FASTA/FASTQ file
#[derive(Parser, Debug)]
#[command(name = "seqplug", version, about)]
struct Cli {
    /// Input FASTA or FASTQ file (optionally compressed)
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output directory for results (also the cache directory unless --cache-dir is set)
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Pipeline specification as JSON: {"order": [...], "configs": {...}}
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for cached k-mer tables
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Motif to search for in the default pipeline
    #[arg(long, value_name = "PATTERN")]
    motif: Option<String>,

    /// Remove all cache entries after the run
    #[arg(long)]
    clear_cache: bool,

    /// Archive cache entries at least this many days old into <OUTPUT>/old_cache.zip
    #[arg(long, value_name = "DAYS", default_value_t = 7)]
    archive_after_days: u64,

    /// Keep aged cache entries in place instead of archiving them
    #[arg(long, conflicts_with = "archive_after_days")]
    no_archive: bool,

    /// Skip malformed records instead of aborting
    #[arg(long)]
    skip_invalid: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

fn default_spec(cache_dir: &Path, motif: Option<&str>) -> PipelineSpec {
    let mut order = vec!["GCContent"];
    if motif.is_some() {
        order.push(MotifSearch::NAME);
    }
    order.push("KmerSpectrum");

    let mut spec = PipelineSpec::new(order)
        .with_config("GCContent", json!({}))
        .with_config("KmerSpectrum", json!({ "cache_dir": cache_dir.display().to_string() }));
    if let Some(motif) = motif {
        spec = spec.with_config(MotifSearch::NAME, json!({ "motif": motif }));
    }
    spec
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let handle = File::create(path)
        .map(BufWriter::new)
        .with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(handle, value)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;
    let cache_dir = cli.cache_dir.clone().unwrap_or_else(|| cli.output.clone());
    let store = CacheStore::open(&cache_dir)?;

    let spec = match &cli.config {
        Some(path) => PipelineSpec::from_path(path)
            .with_context(|| format!("loading pipeline config {}", path.display()))?,
        None => default_spec(&cache_dir, cli.motif.as_deref()),
    };
    let mut pipeline = Pipeline::default();
    let diagnostics = pipeline.configure(spec, cli.verbose > 0);
    if pipeline.is_empty() {
        log::warn!(
            "No analyzers configured ({} diagnostics); only k-mer tables will be written",
            diagnostics.len()
        );
    }

    let policy = if cli.skip_invalid {
        InputPolicy::Skip
    } else {
        InputPolicy::Abort
    };
    let records = RecordReader::from_path(&cli.input)?
        .filter_map(|item| policy.handle(item).transpose())
        .collect::<seqplug::Result<Vec<_>>>()?;
    log::info!("Read {} records from {}", records.len(), cli.input.display());

    let report = pipeline.run_many(&records);
    let report_path = cli.output.join("results.json");
    write_json(&report_path, &report)?;
    log::info!(
        "Wrote {} analyzer reports ({} failures) to {}",
        report.len(),
        report.total_failures(),
        report_path.display()
    );

    let enumerator = kmer::cached_enumerator(store.clone());
    let mut all_kmers = ResultMap::with_capacity(records.len());
    for record in &records {
        all_kmers.insert(record.header(), enumerator.get_or_compute(record)?);
    }
    let kmers_path = cli.output.join("all_kmers.json");
    write_json(&kmers_path, &all_kmers)?;
    let stats = enumerator.stats();
    log::info!(
        "Wrote {} k-mer tables to {} (cache hits: {}, misses: {})",
        all_kmers.len(),
        kmers_path.display(),
        stats.hits,
        stats.misses
    );

    if cli.clear_cache {
        store.clear()?;
    } else if !cli.no_archive {
        let age = Duration::from_secs(cli.archive_after_days.saturating_mul(SECONDS_PER_DAY));
        store.archive_older_than(age, cli.output.join("old_cache.zip"))?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = run(&cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
