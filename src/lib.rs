//! Hark - Podcast Search and Question Answering
//!
//! A local-first tool for turning podcast audio into time-stamped passages and
//! retrieving them with hybrid lexical and semantic search.
//!
//! # Overview
//!
//! Hark allows you to:
//! - Transcribe episodes with word-level timings
//! - Cut transcripts into overlapping time windows with speaker annotations
//! - Rank passages with BM25 and with embeddings, fused by Reciprocal Rank Fusion
//! - Ask questions and get answers citing episode timestamps
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `audio` - Audio hashing, probing and splitting
//! - `transcription` - Speech-to-text transcription
//! - `diarization` - Speaker turns from RTTM files
//! - `chunking` - Time-windowed passage building
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `search` - BM25 ranking and rank fusion
//! - `rag` - Answer generation over retrieved passages
//! - `orchestrator` - Ingestion and retrieval coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use hark::config::Settings;
//! use hark::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings).await?;
//!
//!     orchestrator.ingest_file("episode-42.mp3".as_ref(), false).await?;
//!     for hit in orchestrator.retrieve("memory safety", 5).await? {
//!         println!("{} {}", hit.citation(), hit.document_text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod diarization;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod search;
pub mod transcription;
pub mod vector_store;

pub use error::{HarkError, Result};
