//! The single active semantic index.
//!
//! Holds one mutable slot: the active [`IndexGeneration`], or nothing
//! before the first successful upload. `replace` embeds every chunk
//! *outside* the lock and then swaps the whole generation in atomically,
//! so a concurrent `query` observes either the old generation or the new
//! one — never a half-built mix. Nothing is ever merged: a new upload
//! wholly discards the previous document's chunks.
//!
//! Nearest-neighbor search is a brute-force cosine scan, which is exactly
//! right for the one-document-at-a-time scale this service runs at.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::ServiceError;
use crate::models::Chunk;

/// A chunk together with its embedding vector.
#[derive(Debug, Clone)]
struct EmbeddedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// One atomic version of the index, wholly replaced on each upload.
struct IndexGeneration {
    id: Uuid,
    chunks: Vec<EmbeddedChunk>,
}

/// A retrieval hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Diagnostic snapshot of the active generation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexSnapshot {
    pub generation_id: Option<Uuid>,
    pub chunk_count: usize,
}

pub struct SemanticIndex {
    embedder: Arc<dyn Embedder>,
    active: RwLock<Option<IndexGeneration>>,
}

impl SemanticIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            active: RwLock::new(None),
        }
    }

    /// Embed `chunks` and atomically install them as the new active
    /// generation, discarding the previous one entirely.
    pub async fn replace(&self, chunks: Vec<Chunk>) -> Result<usize, ServiceError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|e| ServiceError::Index(e.to_string()))?;
        if vectors.len() != chunks.len() {
            return Err(ServiceError::Index(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let generation = IndexGeneration {
            id: Uuid::new_v4(),
            chunks: chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
                .collect(),
        };
        let count = generation.chunks.len();
        let id = generation.id;

        // Swap only after every vector exists.
        *self.active.write().await = Some(generation);
        info!(generation = %id, chunks = count, "index generation replaced");
        Ok(count)
    }

    /// Return the `k` nearest chunks to `question` in the active
    /// generation, most similar first.
    pub async fn query(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>, ServiceError> {
        let query_vec = self
            .embedder
            .embed(&[question.to_string()])
            .await
            .map_err(|e| ServiceError::Index(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Index("empty embedding response".to_string()))?;

        let guard = self.active.read().await;
        let generation = guard.as_ref().ok_or(ServiceError::NoActiveIndex)?;

        let mut scored: Vec<ScoredChunk> = generation
            .chunks
            .iter()
            .map(|ec| ScoredChunk {
                chunk: ec.chunk.clone(),
                score: cosine_similarity(&query_vec, &ec.vector),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    pub async fn snapshot(&self) -> IndexSnapshot {
        let guard = self.active.read().await;
        match guard.as_ref() {
            Some(gen) => IndexSnapshot {
                generation_id: Some(gen.id),
                chunk_count: gen.chunks.len(),
            },
            None => IndexSnapshot {
                generation_id: None,
                chunk_count: 0,
            },
        }
    }
}
