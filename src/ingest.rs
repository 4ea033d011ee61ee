//! Ingestion pipeline: sources → chunks → embeddings → CSV tables.

use anyhow::{Context, Result};

use crate::chunk;
use crate::config::Config;
use crate::embedding;
use crate::models::{Chunk, CorpusRecord, Document};
use crate::sources;
use crate::store;
use crate::tokenizer;

/// Scan every configured source, chunk the documents, embed the chunks,
/// and write the corpus and embeddings tables.
///
/// With `dry_run`, stops after chunking and reports counts without
/// touching the embedding provider or the output files.
pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let tokenizer = tokenizer::create_tokenizer(&config.tokenizer)?;

    let mut documents: Vec<Document> = Vec::new();
    for tree in &config.sources.tree {
        documents.extend(sources::scan_tree(tree)?);
    }
    for pages in &config.sources.pages {
        documents.extend(sources::scan_pages(pages)?);
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    for document in &documents {
        chunks.extend(chunk::chunk_document(
            tokenizer.as_ref(),
            document,
            config.chunking.max_tokens,
        )?);
    }

    if dry_run {
        println!("ingest (dry-run)");
        println!("  documents: {}", documents.len());
        println!("  chunks: {}", chunks.len());
        println!("  tokenizer: {}", tokenizer.name());
        return Ok(());
    }

    if let Some(parent) = config.output.corpus_csv.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = config.output.embeddings_csv.parent() {
        std::fs::create_dir_all(parent)?;
    }

    store::write_corpus_csv(&config.output.corpus_csv, &chunks)
        .with_context(|| format!("write {}", config.output.corpus_csv.display()))?;

    let mut records: Vec<CorpusRecord> = chunks.iter().map(CorpusRecord::from_chunk).collect();

    let provider = embedding::create_provider(&config.embedding)?;
    let embedded =
        embedding::embed_all(provider.as_ref(), &mut records, config.embedding.batch_size).await?;

    store::write_embeddings_csv(&config.output.embeddings_csv, &records)
        .with_context(|| format!("write {}", config.output.embeddings_csv.display()))?;

    println!("ingest");
    println!("  documents: {}", documents.len());
    println!("  chunks: {}", chunks.len());
    println!("  embedded: {}", embedded);
    println!("  model: {}", provider.model_name());
    println!("  corpus: {}", config.output.corpus_csv.display());
    println!("  embeddings: {}", config.output.embeddings_csv.display());
    println!("ok");

    Ok(())
}
