//! Retrieval CLI: build an index from a folder of text files and query it.
//!
//! ```bash
//! retrieval ingest data/
//! retrieval query "detective solving a mystery" -k 3
//! retrieval hybrid "planet journey"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use retrieval_core::config::{resolve_with_base, Config, Settings};
use retrieval_core::loader::{load_documents, PlainTextLoader};
use retrieval_embed::get_default_embedder;
use retrieval_hybrid::HybridRetriever;

#[derive(Parser)]
#[command(name = "retrieval", version, about)]
struct Cli {
    /// Explicit TOML config file (default: config.toml + config.<RUST_ENV>.toml)
    #[arg(long, global = true, env = "APP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and index every .txt/.md file under PATH, then save the index
    Ingest {
        /// File or directory to ingest (default: retriever.data_dir)
        path: Option<PathBuf>,
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },
    /// Vector-only nearest-neighbour query
    Query {
        text: String,
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },
    /// Lexical + vector query with duplicate texts removed
    Hybrid {
        text: String,
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let settings = config.settings()?;
    // Paths in an explicit config file are relative to that file.
    let base = match cli.config.as_deref().and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    match cli.command {
        Command::Ingest { path, index_dir } => {
            let path = path.unwrap_or_else(|| resolve_with_base(&base, &settings.retriever.data_dir));
            ingest(&settings, &path, &index_dir_for(&settings, &base, index_dir))
        }
        Command::Query { text, k, index_dir } => {
            let engine = open(&settings, &index_dir_for(&settings, &base, index_dir))?;
            let hits = engine.query(&text, k.unwrap_or(settings.retriever.top_k))?;
            if hits.is_empty() { println!("No relevant chunks found."); }
            for (rank, hit) in hits.iter().enumerate() {
                println!("{}. {} (distance {:.4})\n   {}", rank + 1, hit.chunk_id, hit.distance, hit.text);
            }
            Ok(())
        }
        Command::Hybrid { text, k, index_dir } => {
            let engine = open(&settings, &index_dir_for(&settings, &base, index_dir))?;
            let hits = engine.hybrid_query(&text, k.unwrap_or(settings.retriever.top_k))?;
            if hits.is_empty() { println!("No relevant chunks found."); }
            for (rank, hit) in hits.iter().enumerate() {
                println!("{}. {} [{:?}] (score {:.4})\n   {}", rank + 1, hit.chunk_id, hit.source, hit.score, hit.text);
            }
            Ok(())
        }
    }
}

fn index_dir_for(settings: &Settings, base: &Path, flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| resolve_with_base(base, &settings.retriever.index_dir))
}

fn ingest(settings: &Settings, path: &Path, index_dir: &Path) -> Result<()> {
    info!(path = %path.display(), "Loading documents");
    let report = load_documents(path, &PlainTextLoader)?;
    for skipped in &report.skipped {
        warn!(path = %skipped.path.display(), reason = %skipped.reason, "Skipped file");
    }

    let embedder = get_default_embedder(&settings.embedding)?;
    let mut engine = HybridRetriever::from_settings(embedder, &settings.retriever)?;

    let pb = ProgressBar::new(report.documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?
            .progress_chars("#>-"),
    );
    for document in &report.documents {
        pb.set_message(document.id.clone());
        engine
            .add_documents(std::slice::from_ref(document))
            .with_context(|| format!("Failed to index {}", document.id))?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    if engine.is_empty() {
        warn!(path = %path.display(), "No text found; nothing to save");
        return Ok(());
    }
    engine.save(index_dir)?;
    info!(
        documents = report.documents.len(),
        chunks = engine.len(),
        skipped = report.skipped.len(),
        index_dir = %index_dir.display(),
        "Index saved"
    );
    Ok(())
}

fn open(settings: &Settings, index_dir: &Path) -> Result<HybridRetriever> {
    let embedder = get_default_embedder(&settings.embedding)?;
    let mut engine = HybridRetriever::from_settings(embedder, &settings.retriever)?;
    engine
        .load(index_dir)
        .with_context(|| format!("Failed to load index from {}; run `retrieval ingest` first", index_dir.display()))?;
    info!(chunks = engine.len(), "Index loaded");
    Ok(engine)
}
