//! Caching layer in front of an embedding client
//!
//! Classification text repeats heavily across rows of a report (the same
//! incident type and description appear many times), so embeddings are
//! memoised in a bounded moka cache keyed by a hash of the text.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use sakuna_core::{Result, SakunaError};

use crate::embedding::EmbeddingClient;

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Hit and miss counters
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Embedding client that memoises another client's vectors
#[derive(Clone)]
pub struct CachedEmbedding {
    inner: Arc<dyn EmbeddingClient>,
    cache: Cache<u64, Vec<f32>>,
    stats: Arc<CacheStats>,
}

impl CachedEmbedding {
    pub fn new(inner: Arc<dyn EmbeddingClient>, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(capacity).build(),
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    async fn lookup(&self, text: &str) -> Option<Vec<f32>> {
        let result = self.cache.get(&hash_text(text)).await;
        if result.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        result
    }
}

#[async_trait]
impl EmbeddingClient for CachedEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.lookup(text).await {
            return Ok(vector);
        }

        let vector = self.inner.embed(text).await?;
        self.cache.insert(hash_text(text), vector.clone()).await;
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut slots: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();
        let mut missing_idx = Vec::new();

        for (idx, text) in texts.iter().enumerate() {
            let cached = self.lookup(text).await;
            if cached.is_none() {
                missing.push(text.clone());
                missing_idx.push(idx);
            }
            slots.push(cached);
        }

        if !missing.is_empty() {
            let fresh = self.inner.embed_batch(&missing).await?;
            if fresh.len() != missing.len() {
                return Err(SakunaError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    missing.len(),
                    fresh.len()
                )));
            }

            for ((idx, text), vector) in missing_idx.into_iter().zip(&missing).zip(fresh) {
                self.cache.insert(hash_text(text), vector.clone()).await;
                slots[idx] = Some(vector);
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| SakunaError::Embedding("Missing embedding".to_string())))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
