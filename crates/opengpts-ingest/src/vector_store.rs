//! Vector index with `SQLite` BLOB storage and brute-force KNN search.
//!
//! Documents are scoped by index name and a `namespace` tag; searches never
//! cross namespaces.

use parking_lot::Mutex;
use rusqlite::{Connection, params};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::errors::Result;
use crate::normalize::cosine_similarity;

/// A chunk ready to be indexed.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorDocument {
    /// Namespace tag the document is filed under.
    pub namespace: String,
    /// Chunk text.
    pub content: String,
    /// Free-form metadata stored with the chunk.
    pub metadata: Map<String, Value>,
    /// Embedding of `content`.
    pub embedding: Vec<f32>,
}

/// A single search result.
#[derive(Clone, Debug)]
pub struct SearchHit {
    /// Document id.
    pub id: String,
    /// Chunk text.
    pub content: String,
    /// Stored metadata.
    pub metadata: Map<String, Value>,
    /// Cosine similarity to the query (higher = more similar).
    pub similarity: f32,
}

/// A namespaced vector index.
pub trait VectorStore: Send + Sync {
    /// Store documents, returning their generated ids in input order.
    fn add(&self, documents: &[VectorDocument]) -> Result<Vec<String>>;

    /// The `k` documents in `namespace` most similar to `query`.
    fn search(&self, namespace: &str, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    /// Number of documents in `namespace`.
    fn count(&self, namespace: &str) -> Result<usize>;
}

/// Convert an f32 slice to a byte blob for storage.
pub fn f32_slice_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a byte blob back to an f32 vector.
pub fn blob_to_f32_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// [`VectorStore`] on a single `SQLite` connection.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    index_name: String,
}

impl SqliteVectorStore {
    /// Open (or create) a vector database file.
    pub fn open(path: &str, index_name: &str) -> Result<Self> {
        Self::new(Connection::open(path)?, index_name)
    }

    /// Open a private in-memory vector database.
    pub fn open_in_memory(index_name: &str) -> Result<Self> {
        Self::new(Connection::open_in_memory()?, index_name)
    }

    fn new(conn: Connection, index_name: &str) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS vector_documents (
                id         TEXT PRIMARY KEY,
                index_name TEXT NOT NULL,
                namespace  TEXT NOT NULL,
                content    TEXT NOT NULL,
                metadata   TEXT NOT NULL,
                embedding  BLOB NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_vector_documents_namespace
                ON vector_documents (index_name, namespace);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            index_name: index_name.to_string(),
        })
    }

    /// Index name documents are filed under.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }
}

impl VectorStore for SqliteVectorStore {
    fn add(&self, documents: &[VectorDocument]) -> Result<Vec<String>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(documents.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO vector_documents (id, index_name, namespace, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for doc in documents {
                let id = format!("doc:{}:{}", self.index_name, Uuid::now_v7());
                let metadata = serde_json::to_string(&doc.metadata)?;
                let _ = stmt.execute(params![
                    id,
                    self.index_name,
                    doc.namespace,
                    doc.content,
                    metadata,
                    f32_slice_to_blob(&doc.embedding),
                ])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        debug!(index = %self.index_name, count = ids.len(), "stored vectors");
        Ok(ids)
    }

    fn search(&self, namespace: &str, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, metadata, embedding FROM vector_documents
             WHERE index_name = ?1 AND namespace = ?2",
        )?;
        let rows = stmt
            .query_map(params![self.index_name, namespace], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut hits = rows
            .into_iter()
            .map(|(id, content, metadata, blob)| {
                Ok(SearchHit {
                    id,
                    content,
                    metadata: serde_json::from_str(&metadata)?,
                    similarity: cosine_similarity(query, &blob_to_f32_vec(&blob)),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(k);
        Ok(hits)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn count(&self, namespace: &str) -> Result<usize> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT count(*) FROM vector_documents WHERE index_name = ?1 AND namespace = ?2",
            params![self.index_name, namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
