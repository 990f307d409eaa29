//! Semantic search over session chunks.
//!
//! Retrieval is a brute-force linear scan: every chunk of every loaded
//! document is scored against the query embedding by cosine similarity and
//! the `top_k` best are kept. Chunk embeddings come from the session's
//! [`SessionEmbeddingCache`], so each chunk is embedded at most once.
//!
//! Ranking is stable: chunks with equal scores keep the order in which they
//! were offered (document order, then chunk index).

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::rag::cache::SessionEmbeddingCache;
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{AppError, Chunk, Result, ScoredChunk};

// ============================================================================
// Cosine Similarity
// ============================================================================

/// Why two vectors could not be compared
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimilarityError {
    #[error("zero-norm vector")]
    ZeroNorm,

    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`, in [-1, 1].
///
/// Undefined (and reported as [`SimilarityError::ZeroNorm`]) when either
/// vector has zero norm or the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> std::result::Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Err(SimilarityError::ZeroNorm);
    }

    let score = dot / denom;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(SimilarityError::ZeroNorm)
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Whether `v` has a usable, non-zero norm
fn has_direction(v: &[f32]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    norm > 0.0 && norm.is_finite()
}

/// Score every candidate against `query`, best first.
///
/// Candidates that cannot be scored are skipped with a warning. Equal scores
/// keep their input order.
pub fn rank<'a, I>(query: &[f32], candidates: I) -> Vec<(f32, String)>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut scored: Vec<(f32, String)> = candidates
        .into_iter()
        .filter_map(|(key, embedding)| match cosine_similarity(query, embedding) {
            Ok(score) => Some((score, key.to_string())),
            Err(e) => {
                let err = match e {
                    SimilarityError::ZeroNorm => AppError::DegenerateVector(key.to_string()),
                    SimilarityError::DimensionMismatch { left, right } => {
                        AppError::DimensionMismatch {
                            key: key.to_string(),
                            expected: left,
                            actual: right,
                        }
                    }
                };
                warn!(error = %err, "excluding chunk from ranking");
                None
            }
        })
        .collect();

    // sort_by is stable, so ties stay in insertion order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
}

/// Keep the first `k` ranked entries (all of them if there are fewer)
pub fn top_k<T>(mut ranked: Vec<T>, k: usize) -> Vec<T> {
    ranked.truncate(k);
    ranked
}

// ============================================================================
// Retriever
// ============================================================================

/// Ties the embedding provider, the session cache and the ranker together
pub struct SemanticRetriever<'a> {
    provider: &'a dyn EmbeddingProvider,
    top_k: usize,
    request_timeout: Duration,
}

impl<'a> SemanticRetriever<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider, top_k: usize, request_timeout: Duration) -> Self {
        Self {
            provider,
            top_k,
            request_timeout,
        }
    }

    /// Embed `text`, bounded by the request timeout
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match tokio::time::timeout(self.request_timeout, self.provider.embed(text)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::EmbeddingProvider(format!(
                "'{}' did not respond within {}s",
                self.provider.model_name(),
                self.request_timeout.as_secs_f32()
            ))),
        }
    }

    /// Return the `top_k` chunks most similar to `query`.
    ///
    /// Chunk embeddings missing from `cache` are computed and stored. A
    /// provider failure aborts retrieval; embeddings already cached stay valid.
    /// A query embedding with zero norm matches nothing and yields no chunks.
    pub async fn retrieve(
        &self,
        query: &str,
        chunks: &[Chunk],
        cache: &mut SessionEmbeddingCache,
    ) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embed(query).await?;

        let mut embeddings = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let key = chunk.cache_key();
            let embedding = cache
                .get_or_compute(&key, || self.embed(&chunk.text))
                .await?;
            embeddings.push((key, embedding));
        }

        if !has_direction(&query_embedding) {
            warn!(
                error = %AppError::DegenerateVector(format!("query '{}'", query)),
                "query cannot be ranked against chunks"
            );
            return Ok(Vec::new());
        }

        let by_key: HashMap<&str, &Chunk> = embeddings
            .iter()
            .zip(chunks)
            .map(|((key, _), chunk)| (key.as_str(), chunk))
            .collect();

        let ranked = rank(
            &query_embedding,
            embeddings.iter().map(|(k, e)| (k.as_str(), e.as_slice())),
        );
        debug!(
            candidates = chunks.len(),
            ranked = ranked.len(),
            top_k = self.top_k,
            "ranked chunks"
        );

        Ok(top_k(ranked, self.top_k)
            .into_iter()
            .filter_map(|(score, key)| {
                by_key.get(key.as_str()).map(|chunk| ScoredChunk {
                    score,
                    document: chunk.document.clone(),
                    index: chunk.index,
                    text: chunk.text.clone(),
                })
            })
            .collect())
    }
}
