//! # opengpts-ingest
//!
//! Document ingestion for assistants' retrieval indexes.
//!
//! - **[`splitter`]**: recursive character splitter (paragraphs, lines,
//!   words, characters) with overlap
//! - **[`embedder`]**: [`Embedder`] trait and the `OpenAI` embeddings client
//! - **[`vector_store`]**: [`VectorStore`] trait and the `SQLite` index with
//!   brute-force cosine search
//! - **[`pipeline`]**: [`IngestPipeline`], bound per call to a user and an
//!   assistant whose id is the namespace

#![deny(unsafe_code)]

pub mod embedder;
pub mod errors;
pub mod normalize;
pub mod pipeline;
pub mod splitter;
pub mod vector_store;

pub use embedder::{Embedder, OpenAiEmbedder};
pub use errors::{IngestError, Result};
pub use pipeline::{IngestBinding, IngestPipeline};
pub use splitter::RecursiveCharacterSplitter;
pub use vector_store::{SearchHit, SqliteVectorStore, VectorDocument, VectorStore};
