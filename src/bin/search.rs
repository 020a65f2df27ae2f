//! Search binary entry point.
//!
//! This binary provides a command-line interface for finding similar article
//! titles in a prepared corpus. It supports both single-query and interactive
//! REPL modes, with table or JSON output.
//!
//! # Examples
//!
//! Single query with default settings:
//! ```bash
//! search --corpus corpus.json --query "exercise for knee osteoarthritis"
//! ```
//!
//! JSON output restricted to one region:
//! ```bash
//! search --corpus corpus.json --query "manual therapy" --region Lombalgia --format json
//! ```
//!
//! Interactive mode:
//! ```bash
//! search --corpus corpus.json --interactive
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use evidence_search::{
    api::{SimilarTitlesRequest, SimilarTitlesResponse, SimilarTitlesService},
    corpus::{open_provider, Corpus},
    language::RuleBasedModel,
    normalize::Normalizer,
    query::TitleSearchEngine,
    QualityTier, SearchConfig,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for search results
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-friendly table with colored quality tiers
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Search binary CLI for querying the literature corpus
#[derive(Parser, Debug)]
#[command(
    name = "search",
    version,
    about = "Find articles with titles similar to a query",
    long_about = "Query the literature corpus by title similarity (TF-IDF + cosine). \
                  Results are the top-k most similar titles, ordered by PEDro score.

EXAMPLES:
  Single query:
    search --corpus corpus.json --query \"exercise for knee osteoarthritis\"

  JSON output for one region:
    search --corpus corpus.json --query \"manual therapy\" --region Lombalgia --format json

  Interactive mode:
    search --corpus corpus.json --interactive

  Top 20 results without lemmatization:
    search --corpus corpus.json --query \"ankle sprain\" --top-k 20 --no-lemma"
)]
struct Args {
    /// Prepared corpus file (.json or .csv)
    #[arg(long, value_name = "PATH")]
    corpus: PathBuf,

    /// Search query (required for single-query mode, omitted in interactive mode)
    #[arg(long, value_name = "TEXT", conflicts_with = "interactive")]
    query: Option<String>,

    /// Number of results to return (defaults to the configured value)
    #[arg(long, value_name = "N")]
    top_k: Option<usize>,

    /// Only search articles tagged with this body region
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Use surface forms instead of lemmas for the query
    #[arg(long)]
    no_lemma: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable interactive REPL mode
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Search settings file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lexicon file for the language model (overrides the config file)
    #[arg(long, value_name = "FILE")]
    lexicon: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

/// Load the configuration file, or defaults when none is given
fn load_config(args: &Args) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if args.no_lemma {
        config.use_lemma = false;
    }
    if let Some(lexicon) = &args.lexicon {
        config.lexicon_path = Some(lexicon.clone());
    }
    Ok(config)
}

/// Build the language model from the configured lexicon
fn create_language_model(config: &SearchConfig) -> Result<RuleBasedModel> {
    match &config.lexicon_path {
        Some(path) => {
            info!("Loading lexicon from: {}", path.display());
            RuleBasedModel::from_lexicon_file(path)
                .with_context(|| "Language model unavailable; cannot normalize queries")
        }
        None => Ok(RuleBasedModel::english()),
    }
}

/// Execute a search request and return the response
fn execute_search(
    service: &SimilarTitlesService<RuleBasedModel>,
    query_text: &str,
    top_k: Option<usize>,
    region: Option<String>,
) -> Result<SimilarTitlesResponse> {
    debug!("Executing search for query: {}", query_text);

    let request = SimilarTitlesRequest {
        query: query_text.to_string(),
        top_k,
        region,
    };

    service
        .handle(request)
        .with_context(|| format!("Failed to execute search for query: '{}'", query_text))
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Format results as a pretty table
fn format_results_table(response: &SimilarTitlesResponse) -> String {
    if let Some(prompt) = &response.prompt {
        return prompt.clone();
    }
    if response.results.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Region").add_attribute(Attribute::Bold),
        Cell::new("PEDro").add_attribute(Attribute::Bold),
        Cell::new("Study type").add_attribute(Attribute::Bold),
        Cell::new("Similarity").add_attribute(Attribute::Bold),
    ]);

    for (idx, result) in response.results.iter().enumerate() {
        let color = if result.quality_tier == QualityTier::High.label() {
            Color::Green
        } else {
            Color::Yellow
        };

        table.add_row(vec![
            Cell::new(format!("{}", idx + 1)),
            Cell::new(truncate_chars(&result.title, 70)),
            Cell::new(&result.region),
            Cell::new(result.quality_score).fg(color),
            Cell::new(truncate_chars(&result.study_type, 24)),
            Cell::new(format!("{:.4}", result.similarity)),
        ]);
    }

    table.to_string()
}

/// Format results as JSON
fn format_results_json(response: &SimilarTitlesResponse) -> Result<String> {
    serde_json::to_string_pretty(response)
        .with_context(|| "Failed to serialize results to JSON")
}

fn print_response(response: &SimilarTitlesResponse, format: &OutputFormat, elapsed_secs: f64) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", format_results_table(response));
            if response.prompt.is_none() {
                println!(
                    "\nFound {} results ({} high quality) in {:.3}s",
                    response.count,
                    response.high_quality_count(),
                    elapsed_secs
                );
            }
        }
        OutputFormat::Json => println!("{}", format_results_json(response)?),
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <query>          - Search for similar titles");
    println!("  /top N           - Set number of results to N");
    println!("  /region NAME     - Only search one body region");
    println!("  /region clear    - Search all regions");
    println!("  /regions         - List regions in the corpus");
    println!("  /format table    - Use table output format");
    println!("  /format json     - Use JSON output format");
    println!("  /help            - Show this help");
    println!("  Ctrl+D or Ctrl+C - Exit");
}

/// Run interactive REPL mode
fn run_interactive(
    service: SimilarTitlesService<RuleBasedModel>,
    mut top_k: Option<usize>,
    mut region: Option<String>,
    mut format: OutputFormat,
) -> Result<()> {
    println!("Interactive Title Search");
    print_help();
    println!();

    let mut rl = DefaultEditor::new()
        .with_context(|| "Failed to create readline editor")?;

    loop {
        let readline = rl.readline("Search> ");
        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line).ok();

                if let Some(command) = line.strip_prefix('/') {
                    let (name, rest) = command
                        .split_once(char::is_whitespace)
                        .map(|(n, r)| (n, r.trim()))
                        .unwrap_or((command, ""));
                    match name {
                        "help" => print_help(),
                        "top" => match rest.parse::<usize>() {
                            Ok(n) if n > 0 => {
                                let clamped = service.config().clamp_top_k(Some(n));
                                top_k = Some(clamped);
                                println!("Set top-k to {}", clamped);
                            }
                            _ => eprintln!("Usage: /top N (N a positive integer)"),
                        },
                        "region" => match rest {
                            "" => eprintln!("Usage: /region NAME  or  /region clear"),
                            "clear" => {
                                region = None;
                                println!("Cleared region filter");
                            }
                            name => {
                                region = Some(name.to_string());
                                println!("Set region filter: {}", name);
                            }
                        },
                        "regions" => {
                            for name in service.engine().corpus().regions() {
                                println!("  {}", name);
                            }
                        }
                        "format" => match rest {
                            "table" => {
                                format = OutputFormat::Table;
                                println!("Set output format to table");
                            }
                            "json" => {
                                format = OutputFormat::Json;
                                println!("Set output format to JSON");
                            }
                            _ => eprintln!("Usage: /format [table|json]"),
                        },
                        _ => eprintln!("Unknown command: /{}. Type /help for available commands.", name),
                    }
                } else {
                    let start = Instant::now();
                    match execute_search(&service, line, top_k, region.clone()) {
                        Ok(response) => {
                            if let Err(e) = print_response(&response, &format, start.elapsed().as_secs_f64()) {
                                eprintln!("Error formatting results: {}", e);
                            }
                        }
                        Err(e) => eprintln!("Search failed: {:#}", e),
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level);

    if !args.interactive && args.query.is_none() {
        anyhow::bail!(
            "Either --query or --interactive must be specified.\n\
             Use --help for usage information."
        );
    }

    if !args.corpus.exists() {
        anyhow::bail!(
            "Corpus file not found: {}\n\
             Please run prepare-corpus first to build it.",
            args.corpus.display()
        );
    }

    let config = load_config(&args)?;
    debug!("Search configuration: {:?}", config);

    info!("Loading corpus from: {}", args.corpus.display());
    let provider = open_provider(&args.corpus)
        .await
        .with_context(|| format!("Failed to open corpus {}", args.corpus.display()))?;
    let corpus = Corpus::load(provider.as_ref(), config.max_corpus_size)
        .await
        .with_context(|| "Failed to load corpus")?;

    if corpus.is_empty() {
        anyhow::bail!(
            "Corpus is empty (0 records found).\n\
             Please run prepare-corpus on a non-empty dataset first."
        );
    }
    info!("Corpus contains {} records", corpus.len());

    let model = create_language_model(&config)?;
    info!("Language model initialized: {}", evidence_search::LanguageModel::name(&model));

    let engine = TitleSearchEngine::new(Normalizer::new(model), corpus);
    let service = SimilarTitlesService::new(engine, config);

    if args.interactive {
        run_interactive(service, args.top_k, args.region, args.format)?;
    } else if let Some(query) = args.query.as_deref() {
        let start = Instant::now();
        let response = execute_search(&service, query, args.top_k, args.region.clone())?;
        print_response(&response, &args.format, start.elapsed().as_secs_f64())?;
    }

    Ok(())
}
