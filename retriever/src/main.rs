use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ragcore::{CorpusLoader, IndexOptions, QueryResult, RetrievalConfig, VectorIndex};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "retriever")]
#[command(about = "Query a TF-IDF index built from a directory of text documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Documents directory (overrides config and RAG_DOCS_DIR)
    #[arg(long)]
    docs: Option<PathBuf>,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stem terms before indexing and querying
    #[arg(long, default_value_t = false)]
    stem: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print the best matching snippets
    Query {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Number of candidates before the relevance threshold
        #[arg(short, long)]
        k: Option<usize>,
        /// Print results as a JSON array
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Free-text query
        query: String,
    },
    /// Build the index and print corpus statistics
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { corpus, k, json, query } => {
            let config = resolve_config(&corpus)?;
            let k = k.unwrap_or(config.default_k);
            let index = VectorIndex::open(&config)?;
            let results = index.retrieve(&query, k)?;
            tracing::info!(k, hits = results.len(), "query answered");
            print_results(&results, json)
        }
        Commands::Stats { corpus } => {
            let config = resolve_config(&corpus)?;
            stats(&config)
        }
    }
}

fn resolve_config(args: &CorpusArgs) -> Result<RetrievalConfig> {
    let mut config = match &args.config {
        Some(path) => RetrievalConfig::from_file(path)?,
        None => RetrievalConfig::default(),
    }
    .apply_env();
    if let Some(docs) = &args.docs {
        config.docs_dir = docs.clone();
    }
    if args.stem {
        config.stem = true;
    }
    config.validate().map_err(|e| anyhow!("invalid configuration: {e}"))?;
    tracing::info!(docs_dir = %config.docs_dir.display(), min_score = config.min_score, stem = config.stem, "resolved config");
    Ok(config)
}

fn print_results(results: &[QueryResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results).context("serializing results")?);
        return Ok(());
    }
    if results.is_empty() {
        println!("no relevant snippets");
        return Ok(());
    }
    for r in results {
        let preview: String = r.chunk_text.chars().take(50).collect();
        println!("[{:.4}] {}: {}...", r.score, r.source_label, preview.replace('\n', " "));
    }
    Ok(())
}

fn stats(config: &RetrievalConfig) -> Result<()> {
    let corpus = CorpusLoader::from_config(config).load(&config.docs_dir)?;
    let num_files = corpus.files.len();
    let index = VectorIndex::from_corpus(corpus, IndexOptions::from_config(config));
    let state = if index.is_empty() { "empty" } else { "ready" };
    let vocab = index.vocabulary().map(|v| v.len()).unwrap_or(0);
    println!("docs_dir: {}", config.docs_dir.display());
    println!("state: {state}");
    println!("files: {num_files}");
    println!("chunks: {}", index.len());
    println!("terms: {vocab}");
    Ok(())
}
