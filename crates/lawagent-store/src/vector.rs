//! Vector Store (C3): add/search/delete/count over (id, content, embedding,
//! metadata) triples, backed by SQLite with in-process cosine-similarity
//! scoring. No ANN index is needed at the scale this runtime operates at;
//! the hot path is "a few thousand archived turns per session," not a
//! corpus-scale semantic index.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// A single vector-store record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub timestamp: i64,
}

/// A scored search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub score: f32,
}

/// Exact-equality metadata filter: every key in the filter must match the
/// record's metadata value.
pub type Filter = serde_json::Map<String, serde_json::Value>;

/// SQLite-backed vector store. `initialize` must be called before any
/// mutation; `collection`/`dim` are recorded for diagnostics, not enforced
/// per-row — a single physical table backs the one collection this runtime
/// uses.
pub struct VectorStore {
    db: Database,
    collection: std::sync::Mutex<Option<String>>,
    dim: AtomicUsize,
}

impl VectorStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            collection: std::sync::Mutex::new(None),
            dim: AtomicUsize::new(0),
        }
    }

    pub fn initialize(&self, collection: impl Into<String>, dim: usize) {
        *self.collection.lock().unwrap() = Some(collection.into());
        self.dim.store(dim, Ordering::SeqCst);
    }

    fn ensure_initialized(&self) -> StoreResult<()> {
        if self.collection.lock().unwrap().is_none() {
            return Err(StoreError::InvalidArgument(
                "vector store used before initialize()".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn add(
        &self,
        content: impl Into<String>,
        embedding: Vec<f32>,
        metadata: serde_json::Map<String, serde_json::Value>,
        id: Option<String>,
    ) -> StoreResult<String> {
        self.ensure_initialized()?;
        let id = id.unwrap_or_else(|| Uuid::now_v7().to_string());
        let content = content.into();
        let metadata_json = serde_json::to_string(&metadata)?;
        let embedding_blob = encode_embedding(&embedding);
        let now = Utc::now().timestamp();
        let id_clone = id.clone();

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO vector_records (id, content, embedding, metadata, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![id_clone, content, embedding_blob, metadata_json, now],
                )?;
                Ok(())
            })
            .await?;

        Ok(id)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<VectorRecord>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let row = conn.query_row(
                    "SELECT id, content, embedding, metadata, created_at FROM vector_records WHERE id = ?1",
                    [&id],
                    row_to_record,
                );
                match row {
                    Ok(record) => Ok(Some(record?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let id = id.to_string();
        let deleted = self
            .db
            .execute(move |conn| {
                Ok(conn.execute("DELETE FROM vector_records WHERE id = ?1", [&id])?)
            })
            .await?;
        Ok(deleted > 0)
    }

    pub async fn clear(&self) -> StoreResult<bool> {
        self.db
            .execute(move |conn| {
                conn.execute("DELETE FROM vector_records", [])?;
                Ok(true)
            })
            .await
    }

    pub async fn count(&self, filter: Option<Filter>) -> StoreResult<usize> {
        let records = self.all_records().await?;
        Ok(records
            .into_iter()
            .filter(|r| matches_filter(&r.metadata, filter.as_ref()))
            .count())
    }

    /// Cosine-similarity search over records matching `filter`, returning
    /// the top `k` hits sorted by descending score.
    pub async fn search(&self, query_embedding: &[f32], k: usize, filter: Option<Filter>) -> StoreResult<Vec<SearchHit>> {
        let records = self.all_records().await?;
        let mut scored: Vec<SearchHit> = records
            .into_iter()
            .filter(|r| matches_filter(&r.metadata, filter.as_ref()))
            .map(|r| {
                let score = cosine_similarity(query_embedding, &r.embedding);
                SearchHit {
                    id: r.id,
                    content: r.content,
                    metadata: r.metadata,
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn all_records(&self) -> StoreResult<Vec<VectorRecord>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare("SELECT id, content, embedding, metadata, created_at FROM vector_records")?;
                let rows = stmt.query_map([], row_to_record)?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row??);
                }
                Ok(out)
            })
            .await
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<StoreResult<VectorRecord>> {
    let id: String = row.get(0)?;
    let content: String = row.get(1)?;
    let embedding_blob: Vec<u8> = row.get(2)?;
    let metadata_json: String = row.get(3)?;
    let created_at: i64 = row.get(4)?;

    Ok((|| {
        let embedding = decode_embedding(&embedding_blob);
        let metadata: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&metadata_json)?;
        Ok(VectorRecord {
            id,
            content,
            embedding,
            metadata,
            timestamp: created_at,
        })
    })())
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn matches_filter(metadata: &serde_json::Map<String, serde_json::Value>, filter: Option<&Filter>) -> bool {
    let Some(filter) = filter else { return true };
    filter.iter().all(|(key, value)| metadata.get(key) == Some(value))
}

/// Cosine similarity remapped to `[0, 1]` (higher = closer).
/// Degenerate (zero-norm or mismatched-length) vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        warn!(len_a = a.len(), len_b = b.len(), "cosine_similarity on mismatched vectors");
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let raw = dot / (norm_a * norm_b);
    ((raw + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> serde_json::Map<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    async fn store() -> VectorStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        let store = VectorStore::new(db);
        store.initialize("test", 3);
        store
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_half() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_similarity(&a, &b) - 0.5).abs() < 1e-5);
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let store = store().await;
        let id = store
            .add("hello", vec![1.0, 0.0, 0.0], meta(&[("type", "conversation")]), None)
            .await
            .unwrap();
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.content, "hello");
        assert_eq!(record.embedding, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn search_returns_top_k_sorted_descending() {
        let store = store().await;
        store.add("a", vec![1.0, 0.0, 0.0], meta(&[]), None).await.unwrap();
        store.add("b", vec![0.0, 1.0, 0.0], meta(&[]), None).await.unwrap();
        store.add("c", vec![0.9, 0.1, 0.0], meta(&[]), None).await.unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "a");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn filter_matches_exact_equality_on_every_key() {
        let store = store().await;
        store
            .add("archived", vec![1.0, 0.0, 0.0], meta(&[("type", "conversation"), ("archived", "true")]), None)
            .await
            .unwrap();
        store
            .add("live", vec![1.0, 0.0, 0.0], meta(&[("type", "conversation")]), None)
            .await
            .unwrap();

        let filter = meta(&[("type", "conversation"), ("archived", "true")]);
        let count = store.count(Some(filter)).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = store().await;
        let id = store.add("x", vec![1.0, 0.0, 0.0], meta(&[]), None).await.unwrap();
        assert!(store.delete(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn count_with_no_filter_counts_everything() {
        let store = store().await;
        store.add("a", vec![1.0, 0.0, 0.0], meta(&[]), None).await.unwrap();
        store.add("b", vec![0.0, 1.0, 0.0], meta(&[]), None).await.unwrap();
        assert_eq!(store.count(None).await.unwrap(), 2);
    }
}
