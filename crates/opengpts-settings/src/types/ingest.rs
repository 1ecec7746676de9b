//! Document ingestion settings (splitter, embeddings, vector index).

use serde::{Deserialize, Serialize};

/// Document ingestion pipeline settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Vector index name.
    pub index_name: String,
    /// Payload field holding the document text.
    pub input_key: String,
    /// Path to the vector database (may contain `~`).
    pub vector_db_path: String,
    /// Embedding provider.
    pub embedding: EmbeddingSettings,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            index_name: "opengpts".to_string(),
            input_key: "file_contents".to_string(),
            vector_db_path: "~/.opengpts/vectors.db".to_string(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

/// `OpenAI`-compatible embeddings endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Embedding model name.
    pub model: String,
    /// API base URL (without the `/embeddings` suffix).
    pub base_url: String,
    /// API key (`OPENAI_API_KEY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout_ms: 60_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_defaults() {
        let s = IngestSettings::default();
        assert_eq!(s.chunk_size, 1000);
        assert_eq!(s.chunk_overlap, 200);
        assert_eq!(s.index_name, "opengpts");
        assert_eq!(s.input_key, "file_contents");
        assert_eq!(s.vector_db_path, "~/.opengpts/vectors.db");
    }

    #[test]
    fn embedding_defaults() {
        let e = EmbeddingSettings::default();
        assert_eq!(e.model, "text-embedding-ada-002");
        assert_eq!(e.base_url, "https://api.openai.com/v1");
        assert!(e.api_key.is_none());
        assert_eq!(e.timeout_ms, 60_000);
    }

    #[test]
    fn api_key_deserializes() {
        let e: EmbeddingSettings =
            serde_json::from_value(serde_json::json!({"apiKey": "sk-test"})).unwrap();
        assert_eq!(e.api_key.as_deref(), Some("sk-test"));
        assert_eq!(e.model, "text-embedding-ada-002");
    }
}
