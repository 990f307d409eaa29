//! Session-scoped embedding cache
//!
//! Chunk embeddings are computed lazily, the first time a chunk is scored, and
//! kept for the lifetime of the session. Keys are `"{document}_{chunk_index}"`
//! (see [`Chunk::cache_key`](crate::types::Chunk::cache_key)), so repeated
//! queries over the same corpus only pay for the query embedding.
//!
//! The cache is owned by a single session and mutated through `&mut self`;
//! there is no eviction and no expiry.
//!
//! # Example
//!
//! ```ignore
//! use lexa::rag::cache::SessionEmbeddingCache;
//!
//! let mut cache = SessionEmbeddingCache::new();
//! let vector = cache
//!     .get_or_compute("MSA_0", || provider.embed(&chunk.text))
//!     .await?;
//! ```

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Result;

// ============================================================================
// Cache Types
// ============================================================================

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to call the provider
    pub misses: u64,
    /// Number of entries in cache
    pub entry_count: usize,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

// ============================================================================
// Cache Trait
// ============================================================================

/// Storage interface for embeddings
pub trait EmbeddingCache {
    /// Get an embedding from the cache
    fn get(&mut self, key: &str) -> Option<&[f32]>;

    /// Store an embedding under `key`
    fn set(&mut self, key: &str, embedding: Vec<f32>);

    /// Whether `key` has been computed, without touching statistics
    fn contains(&self, key: &str) -> bool;

    /// Number of cached embeddings
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    fn stats(&self) -> CacheStats;
}

// ============================================================================
// Session Embedding Cache
// ============================================================================

/// Unbounded in-memory cache, one per session
#[derive(Debug, Default)]
pub struct SessionEmbeddingCache {
    entries: HashMap<String, Vec<f32>>,
    hits: u64,
    misses: u64,
}

impl SessionEmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached vector for `key`, computing it on a miss.
    ///
    /// `compute` runs at most once per key over the cache's lifetime. If it
    /// fails, the error is returned and nothing is stored, so a later call
    /// for the same key retries the provider.
    pub async fn get_or_compute<F, Fut>(&mut self, key: &str, compute: F) -> Result<Vec<f32>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<f32>>>,
    {
        if let Some(embedding) = self.get(key) {
            debug!(key, "embedding cache hit");
            return Ok(embedding.to_vec());
        }

        debug!(key, "embedding cache miss");
        let embedding = compute().await?;
        self.set(key, embedding.clone());
        Ok(embedding)
    }
}

impl EmbeddingCache for SessionEmbeddingCache {
    fn get(&mut self, key: &str) -> Option<&[f32]> {
        match self.entries.get(key) {
            Some(embedding) => {
                self.hits += 1;
                Some(embedding.as_slice())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn set(&mut self, key: &str, embedding: Vec<f32>) {
        self.entries.insert(key.to_string(), embedding);
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entry_count: self.entries.len(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
