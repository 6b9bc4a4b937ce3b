use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stasis_core::{RankEngine, RankError, RankOptions};
use stasis_corpus::{MemoryCorpus, StasisConfig, create_embedder, load_files};

#[derive(Parser)]
#[command(
    name = "stasis",
    about = "Stasis filtering and gradient proximity ranking over a text corpus"
)]
struct Cli {
    /// Corpus file (.jsonl or .txt); repeat for several
    #[arg(long, global = true)]
    corpus: Vec<PathBuf>,

    /// TOML config file (falls back to $STASIS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of results to return
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Minimum Stasis score
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Rank by embedding similarity only
    #[arg(long, global = true)]
    no_cross_reference: bool,

    /// Extra stop term; repeat for several
    #[arg(long, global = true)]
    stop_term: Vec<String>,

    /// Word that marks a message boundary, e.g. a speaker name
    #[arg(long, global = true)]
    boundary_marker: Vec<String>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank corpus chunks against a query and print them as JSON
    Query {
        /// Text to query
        text: String,
    },

    /// Show which query term would anchor gradient propagation
    Anchor {
        /// Text to query
        text: String,
    },

    /// Show corpus statistics
    Stats {
        /// How many of the rarest terms to list
        #[arg(long, default_value_t = 10)]
        rarest: usize,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = StasisConfig::resolve(cli.config.as_deref()).context("failed to load config")?;
    let options = resolve_options(&cli, &config)?;
    let corpus = open_corpus(&cli.corpus, &config)?;
    let engine = RankEngine::new(&corpus);

    match &cli.command {
        Commands::Query { text } => cmd_query(&engine, text, &options),
        Commands::Anchor { text } => cmd_anchor(&engine, text, &options),
        Commands::Stats { rarest } => cmd_stats(&engine, *rarest, &options),
    }
}

/// Config file values, then explicit flags on top.
fn resolve_options(cli: &Cli, config: &StasisConfig) -> Result<RankOptions> {
    let mut options = config.ranking.clone().into_options();
    if let Some(top_k) = cli.top_k {
        options.top_k = top_k;
    }
    if let Some(threshold) = cli.threshold {
        options.stasis_threshold = threshold;
    }
    if cli.no_cross_reference {
        options.use_cross_reference = false;
    }
    options = options.with_stop_terms(&cli.stop_term);
    if !cli.boundary_marker.is_empty() {
        let markers = config
            .ranking
            .boundary_markers
            .iter()
            .chain(&cli.boundary_marker);
        options = options.with_boundary_markers(markers);
    }
    options.validate().context("invalid ranking options")?;
    Ok(options)
}

fn open_corpus(paths: &[PathBuf], config: &StasisConfig) -> Result<MemoryCorpus> {
    if paths.is_empty() {
        bail!("at least one --corpus file is required");
    }
    let records = load_files(paths).context("failed to load corpus")?;
    let embedder = create_embedder(&config.embedding).context("failed to create embedder")?;
    tracing::info!(
        "embedding {} chunks with {}",
        records.len(),
        embedder.model_name()
    );

    let mut corpus = MemoryCorpus::new(embedder);
    corpus.extend(records).context("failed to embed corpus")?;
    Ok(corpus)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: &'a str,
    results: Vec<stasis_core::RankedResult>,
}

fn cmd_query(engine: &RankEngine<&MemoryCorpus>, text: &str, options: &RankOptions) -> Result<()> {
    let results = engine.rank(text, options).context("ranking failed")?;
    print_json(&QueryOutput {
        query: text,
        results,
    })
}

#[derive(Serialize)]
struct AnchorOutput<'a> {
    query: &'a str,
    anchor: Option<stasis_core::Anchor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn cmd_anchor(engine: &RankEngine<&MemoryCorpus>, text: &str, options: &RankOptions) -> Result<()> {
    let (anchor, reason) = match engine.anchor(text, options) {
        Ok(anchor) => (Some(anchor), None),
        Err(e @ (RankError::EmptyQuery | RankError::NoEligibleAnchor)) => (None, Some(e.to_string())),
        Err(e) => return Err(e).context("anchor selection failed"),
    };
    print_json(&AnchorOutput {
        query: text,
        anchor,
        reason,
    })
}

#[derive(Serialize)]
struct StatsOutput {
    chunks: usize,
    vocabulary: usize,
    rarest: Vec<TermCount>,
}

#[derive(Serialize)]
struct TermCount {
    term: String,
    frequency: usize,
}

fn cmd_stats(engine: &RankEngine<&MemoryCorpus>, rarest: usize, options: &RankOptions) -> Result<()> {
    let stats = engine
        .term_stats(&options.tokenizer_config())
        .context("failed to compute term statistics")?;
    print_json(&StatsOutput {
        chunks: stats.num_chunks(),
        vocabulary: stats.vocabulary_size(),
        rarest: stats
            .rarest(rarest)
            .into_iter()
            .map(|(term, frequency)| TermCount { term, frequency })
            .collect(),
    })
}
