//! Ingestion pipeline: split, embed, index.
//!
//! The pipeline is configured once and bound per call to a user and an
//! assistant ([`IngestBinding`]). Chunks are filed under the assistant's
//! namespace so retrieval for one assistant never sees another's documents.

use std::path::Path;
use std::sync::Arc;

use opengpts_settings::{IngestSettings, expand_home};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::embedder::{Embedder, OpenAiEmbedder};
use crate::errors::{IngestError, Result};
use crate::splitter::RecursiveCharacterSplitter;
use crate::vector_store::{SearchHit, SqliteVectorStore, VectorDocument, VectorStore};

/// Runtime values an ingest call is bound to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestBinding {
    /// Owning user.
    pub user_id: Option<String>,
    /// Assistant the documents belong to; also the namespace.
    pub assistant_id: Option<String>,
}

impl IngestBinding {
    /// Bind both values.
    pub fn new(user_id: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            assistant_id: Some(assistant_id.into()),
        }
    }

    fn user_id(&self) -> Result<&str> {
        bound("user_id", self.user_id.as_deref())
    }

    fn namespace(&self) -> Result<&str> {
        bound("assistant_id", self.assistant_id.as_deref())
    }
}

fn bound<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IngestError::Config(format!("{name} is not bound")))
}

/// Splits documents, embeds the chunks and stores them in a vector index.
pub struct IngestPipeline {
    splitter: RecursiveCharacterSplitter,
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorStore>,
    input_key: String,
}

impl IngestPipeline {
    /// Assemble a pipeline from its parts.
    pub fn new(
        splitter: RecursiveCharacterSplitter,
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        input_key: impl Into<String>,
    ) -> Self {
        Self {
            splitter,
            embedder,
            vectors,
            input_key: input_key.into(),
        }
    }

    /// Build the default pipeline: `OpenAI` embeddings into a `SQLite`
    /// vector database at `settings.vector_db_path`.
    pub fn from_settings(settings: &IngestSettings) -> Result<Self> {
        let splitter = RecursiveCharacterSplitter::new(settings.chunk_size, settings.chunk_overlap)?;
        let embedder = OpenAiEmbedder::new(&settings.embedding)?;

        let path = expand_home(&settings.vector_db_path);
        if let Some(parent) = Path::new(&path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }
        let vectors = SqliteVectorStore::open(&path, &settings.index_name)?;
        info!(path = %path, index = %settings.index_name, "opened vector store");

        Ok(Self::new(
            splitter,
            Arc::new(embedder),
            Arc::new(vectors),
            settings.input_key.clone(),
        ))
    }

    /// Ingest the document held in the payload's input key. Returns the ids
    /// of the stored chunks.
    pub async fn ingest(&self, binding: &IngestBinding, payload: &Value) -> Result<Vec<String>> {
        let text = payload
            .get(&self.input_key)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                IngestError::Config(format!("payload has no string field `{}`", self.input_key))
            })?;
        self.ingest_text(binding, text).await
    }

    /// Ingest raw document text.
    pub async fn ingest_text(&self, binding: &IngestBinding, text: &str) -> Result<Vec<String>> {
        let user_id = binding.user_id()?;
        let namespace = binding.namespace()?;

        let chunks = self.splitter.split_text(text);
        if chunks.is_empty() {
            debug!(user_id, namespace, "document produced no chunks");
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_documents(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(IngestError::EmbeddingCount {
                expected: chunks.len(),
                actual: embeddings.len(),
            });
        }

        let documents: Vec<VectorDocument> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| {
                let mut metadata = Map::new();
                let _ = metadata.insert("namespace".into(), Value::from(namespace));
                let _ = metadata.insert("user_id".into(), Value::from(user_id));
                let _ = metadata.insert("assistant_id".into(), Value::from(namespace));
                let _ = metadata.insert("chunk".into(), Value::from(i));
                VectorDocument {
                    namespace: namespace.to_string(),
                    content,
                    metadata,
                    embedding,
                }
            })
            .collect();

        let ids = self.vectors.add(&documents)?;
        info!(user_id, namespace, chunks = ids.len(), "ingested document");
        Ok(ids)
    }

    /// The `k` chunks in the bound assistant's namespace closest to `query`.
    pub async fn search(
        &self,
        binding: &IngestBinding,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let namespace = binding.namespace()?;
        let embedding = self.embedder.embed_query(query).await?;
        self.vectors.search(namespace, &embedding, k)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
