//! Corpus preparation binary entry point.
//!
//! This binary runs the offline preparation step: it reads raw article
//! records, normalizes every title with the same settings used at query time,
//! and writes the searchable corpus as JSON.
//!
//! # Examples
//!
//! Prepare a corpus from the spreadsheet export:
//! ```bash
//! prepare-corpus --input articles.csv --output corpus.json
//! ```
//!
//! Re-normalize an existing JSON corpus without lemmas:
//! ```bash
//! prepare-corpus --input corpus.json --output corpus_surface.json --no-lemma
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use evidence_search::{
    corpus::{json_file::write_records, open_provider, prepare::prepare_records},
    language::RuleBasedModel,
    normalize::Normalizer,
    LanguageModel,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Preparation CLI for building the searchable corpus
#[derive(Parser, Debug)]
#[command(
    name = "prepare-corpus",
    version,
    about = "Normalize article titles and write the searchable corpus",
    long_about = "Offline preparation of the literature corpus: normalizes every title \
                  (lowercase, stop words and punctuation removed, optional lemmas) and writes JSON.

EXAMPLES:
  Prepare from a CSV export:
    prepare-corpus --input articles.csv --output corpus.json

  Keep surface forms instead of lemmas:
    prepare-corpus --input articles.csv --output corpus.json --no-lemma

  Use a custom lexicon:
    prepare-corpus --input articles.csv --output corpus.json --lexicon lexicon/en.toml"
)]
struct PrepareArgs {
    /// Raw records (.json or .csv)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output JSON file for the prepared corpus
    #[arg(short, long, value_name = "FILE", default_value = "corpus.json")]
    output: PathBuf,

    /// Keep surface forms instead of lemmas
    #[arg(long)]
    no_lemma: bool,

    /// Lexicon file for the language model
    #[arg(long, value_name = "FILE")]
    lexicon: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging subsystem with the specified level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn create_language_model(args: &PrepareArgs) -> Result<RuleBasedModel> {
    match &args.lexicon {
        Some(path) => {
            info!("Loading lexicon from: {}", path.display());
            RuleBasedModel::from_lexicon_file(path)
                .with_context(|| "Language model unavailable; cannot prepare corpus")
        }
        None => Ok(RuleBasedModel::english()),
    }
}

/// Create a progress bar for tracking preparation
fn create_progress_bar(total: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} titles | Empty: {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = PrepareArgs::parse();

    init_logging(&args.log_level);

    info!("Starting corpus preparation");
    debug!("CLI arguments: {:?}", args);

    let start_time = Instant::now();

    if !args.input.exists() {
        error!("Input file does not exist: {:?}", args.input);
        anyhow::bail!("Input file not found: {:?}", args.input);
    }

    let model = create_language_model(&args)?;
    info!("Language model initialized: {}", model.name());
    let normalizer = Normalizer::new(model);

    info!("Loading records from {:?}...", args.input);
    let provider = open_provider(&args.input)
        .await
        .with_context(|| format!("Failed to load records from {:?}", args.input))?;

    let record_count = provider.count_records().await?;
    info!("Found {} records from {}", record_count, provider.name());

    if record_count == 0 {
        warn!("No records found in input file");
        return Ok(());
    }

    let records = provider
        .fetch_records()
        .await
        .context("Failed to read records")?;

    let progress = create_progress_bar(record_count)?;
    progress.set_message("0");

    let use_lemma = !args.no_lemma;
    info!("Normalizing titles (use_lemma={})...", use_lemma);
    let (prepared, stats) = prepare_records(&normalizer, records, use_lemma, |stats| {
        progress.set_position(stats.processed as u64);
        progress.set_message(format!("{}", stats.empty_after_normalization));
    })
    .context("Failed to normalize titles")?;

    progress.finish_with_message(format!("{}", stats.empty_after_normalization));

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
            info!("Created output directory: {:?}", parent);
        }
    }

    write_records(&args.output, &prepared)
        .await
        .with_context(|| format!("Failed to write corpus to {:?}", args.output))?;

    let elapsed = start_time.elapsed();
    println!("\n╔════════════════════════════════════════╗");
    println!("║      Preparation Completed             ║");
    println!("╠════════════════════════════════════════╣");
    println!("║ Total processed:      {:>16} ║", stats.processed);
    println!("║ Normalized:           {:>16} ║", stats.normalized);
    println!("║ Empty after cleanup:  {:>16} ║", stats.empty_after_normalization);
    println!("║ Elapsed time:         {:>13.2?} ║", elapsed);
    println!("╚════════════════════════════════════════╝");

    if stats.empty_after_normalization > 0 {
        warn!(
            "{} titles have no content words and will never match a query",
            stats.empty_after_normalization
        );
    }

    info!("Corpus written to {:?}", args.output);

    Ok(())
}
