//! # Corpus QA
//!
//! A retrieval-augmented question answering pipeline over local text corpora.
//!
//! Corpus QA ingests documents from source trees and crawled-page
//! directories, chunks them on sentence boundaries under a token budget,
//! embeds the chunks through a provider API, and answers questions by
//! packing the nearest chunks into a bounded prompt for a completion model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │   Sources   │──▶│   Pipeline   │──▶│    CSV    │
//! │ tree/pages  │   │ Chunk+Embed  │   │  tables   │
//! └─────────────┘   └──────────────┘   └─────┬─────┘
//!                                            │
//!                                            ▼
//!                                     ┌─────────────┐
//!                                     │  Retriever  │
//!                                     │  + Answerer │
//!                                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cqa ingest                        # scan, chunk, embed, write tables
//! cqa ask "How is retry handled?"   # answer grounded in the corpus
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`sources`] | Source tree and crawled-page adapters |
//! | [`tokenizer`] | Token counting backends |
//! | [`chunk`] | Sentence-boundary chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`completion`] | Completion provider abstraction |
//! | [`store`] | CSV tables and the corpus handle |
//! | [`retrieve`] | Distance ranking and context packing |
//! | [`answer`] | Budget-checked question answering |
//! | [`ingest`] | End-to-end ingestion pipeline |
//! | [`error`] | Error taxonomy |

pub mod answer;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod retrieve;
pub mod sources;
pub mod store;
pub mod tokenizer;
