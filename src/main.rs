//! # Corpus QA CLI (`cqa`)
//!
//! The `cqa` binary drives the pipeline end to end: ingest builds the
//! corpus and embeddings tables, ask answers a question grounded in them.
//!
//! ## Usage
//!
//! ```bash
//! cqa --config ./config/cqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cqa ingest` | Scan sources, chunk, embed, and write the CSV tables |
//! | `cqa ask "<question>"` | Answer a question from the embedded corpus |
//!
//! ## Examples
//!
//! ```bash
//! # Preview what ingestion would process
//! cqa ingest --dry-run --config ./config/cqa.toml
//!
//! # Build the corpus and embeddings tables
//! cqa ingest --config ./config/cqa.toml
//!
//! # Ask a grounded question
//! cqa ask "How does the scheduler handle retries?" --config ./config/cqa.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use corpus_qa::{answer, completion, config, embedding, ingest, store};

/// Corpus QA CLI — retrieval-augmented question answering over local
/// text corpora.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/cqa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cqa",
    about = "Corpus QA — retrieval-augmented question answering over local text corpora",
    version,
    long_about = "Corpus QA ingests documents from source trees and crawled-page directories, \
    chunks them on sentence boundaries under a token budget, embeds the chunks, and answers \
    questions by packing the nearest chunks into a bounded prompt for a completion model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/cqa.toml`. All source, chunking, embedding,
    /// and completion settings are read from this file.
    #[arg(long, global = true, default_value = "./config/cqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scan sources, chunk, embed, and write the corpus tables.
    ///
    /// Walks every configured source tree and pages directory, chunks the
    /// documents under the token budget, embeds the chunks through the
    /// configured provider, and writes the corpus and embeddings CSVs.
    Ingest {
        /// Show document and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer a question grounded in the embedded corpus.
    ///
    /// Embeds the question, ranks stored chunks by cosine distance, packs
    /// the nearest ones under the context token budget, and asks the
    /// completion model. Questions the context cannot answer come back as
    /// "I don't know".
    Ask {
        /// The question to answer.
        question: String,

        /// Embeddings CSV to load (overrides the configured output path).
        #[arg(long)]
        embeddings: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Ask {
            question,
            embeddings,
        } => {
            let path = embeddings.unwrap_or_else(|| cfg.output.embeddings_csv.clone());
            let corpus = store::CorpusHandle::load(&path)?;

            let embedding_provider = embedding::create_provider(&cfg.embedding)?;
            let completion_provider = completion::create_provider(&cfg.completion)?;

            let reply = answer::answer(
                embedding_provider.as_ref(),
                completion_provider.as_ref(),
                &question,
                &corpus,
                &cfg.completion.limits(),
            )
            .await?;

            println!("{}", reply);
        }
    }

    Ok(())
}
