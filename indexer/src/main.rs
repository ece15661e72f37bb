use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eensy_core::{Index, IndexConfig, IndexReader, SearchResult};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "eensy")]
#[command(about = "Build and query a TF-IDF inverted index over a directory of text files", long_about = None)]
struct Cli {
    /// JSON config file (stop_words, skip_empty_documents, default_limit)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory of text files and write the index to disk
    Build {
        /// Directory of documents (not recursive)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Skip files without indexable terms instead of failing
        #[arg(long, default_value_t = false)]
        skip_empty: bool,
    },
    /// Index a directory in memory and run one query against it
    Search {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        query: String,
        /// Maximum number of results (defaults to the configured limit)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
        #[arg(long, default_value_t = false)]
        skip_empty: bool,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show what a persisted index contains
    Inspect {
        #[arg(long)]
        index: PathBuf,
        /// Print df and postings for one term
        #[arg(long)]
        term: Option<String>,
    },
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    query: &'a str,
    took_s: f64,
    total_hits: usize,
    results: &'a [SearchResult<'a>],
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => IndexConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IndexConfig::default(),
    };

    match cli.command {
        Commands::Build { input, output, skip_empty } => {
            config.skip_empty_documents |= skip_empty;
            build_index(&input, &output, &config)
        }
        Commands::Search { input, query, limit, skip_empty, json } => {
            config.skip_empty_documents |= skip_empty;
            run_search(&input, &query, limit, json, &config)
        }
        Commands::Inspect { index, term } => inspect(&index, term.as_deref()),
    }
}

fn build_index(input: &Path, output: &Path, config: &IndexConfig) -> Result<()> {
    let index = Index::from_dir_with_config(input, config)
        .with_context(|| format!("indexing {}", input.display()))?;
    index.persist(output).with_context(|| format!("writing index to {}", output.display()))?;
    println!("indexed {} documents, {} terms -> {}", index.num_docs(), index.num_terms(), output.display());
    Ok(())
}

fn run_search(input: &Path, query: &str, limit: Option<i64>, json: bool, config: &IndexConfig) -> Result<()> {
    let index = Index::from_dir_with_config(input, config)
        .with_context(|| format!("indexing {}", input.display()))?;
    let start = std::time::Instant::now();
    let limit = resolve_limit(limit, index.default_limit())?;
    let results = index.search(query, limit)?;
    let took_s = start.elapsed().as_secs_f64();
    tracing::info!(query, hits = results.len(), took_s, "search finished");

    if json {
        let response = SearchResponse { query, took_s, total_hits: results.len(), results: &results };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if results.is_empty() {
        println!("no matches for {query:?}");
    } else {
        for (rank, hit) in results.iter().enumerate() {
            println!("{:>3}. {:<30} {:>10.3}", rank + 1, hit.document.name, hit.score);
        }
    }
    Ok(())
}

fn inspect(index_dir: &Path, term: Option<&str>) -> Result<()> {
    let reader = IndexReader::open(index_dir).with_context(|| format!("opening {}", index_dir.display()))?;
    let Some(term) = term else {
        println!("{} documents, {} terms", reader.documents().len(), reader.terms().len());
        return Ok(());
    };

    match reader.postings(term)? {
        None => println!("{term:?} is not indexed"),
        Some(postings) => {
            println!("{term:?}: df={}", postings.len());
            for p in postings {
                let name = reader.documents().get(p.doc_id as usize).map_or("?", |d| d.name.as_str());
                println!("  {:<30} tf={:<4} offsets={:?}", name, p.term_frequency(), p.offsets);
            }
        }
    }
    Ok(())
}

fn resolve_limit(limit: Option<i64>, default_limit: usize) -> Result<i64> {
    match limit {
        Some(limit) => Ok(limit),
        None => i64::try_from(default_limit)
            .map_err(|_| anyhow::anyhow!("configured default_limit {default_limit} is too large")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_limit_wins() {
        assert_eq!(resolve_limit(Some(-1), 10).unwrap(), -1);
        assert_eq!(resolve_limit(Some(3), 10).unwrap(), 3);
    }

    #[test]
    fn default_limit_is_used_when_absent() {
        assert_eq!(resolve_limit(None, 10).unwrap(), 10);
    }

    #[test]
    fn oversized_default_limit_is_rejected() {
        let err = resolve_limit(None, usize::MAX).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
