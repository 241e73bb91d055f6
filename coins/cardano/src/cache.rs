//! Time-bounded memoization of script evaluation results.
//!
//! Planning the same transaction twice (a retry, or a wallet refreshing its preview) should
//! not hit the evaluation oracle twice. Results are keyed by the Blake2b-256 hash of the
//! unsigned transaction bytes.

use std::hash::Hash;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use crate::config::CacheConfig;
use crate::error::EvaluationError;
use crate::evaluation::{EvaluatedRedeemer, ScriptEvaluationOracle};
use crate::hash::blake2b_256;

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    cached_at: Instant,
}

/// Concurrent map whose entries expire after a fixed time to live.
#[derive(Debug)]
pub struct TtlCache<K: Eq + Hash, V> {
    config: CacheConfig,
    entries: DashMap<K, CachedEntry<V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    fn is_valid(&self, entry: &CachedEntry<V>) -> bool {
        entry.cached_at.elapsed() < self.config.ttl
    }

    /// Returns a live entry.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| self.is_valid(entry))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value`, first dropping expired entries and then the oldest ones if the cache
    /// is full.
    pub fn insert(&self, key: K, value: V) {
        if self.config.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.config.max_entries && !self.entries.contains_key(&key) {
            self.clear_expired();
            while self.entries.len() >= self.config.max_entries {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|entry| entry.value().cached_at)
                    .map(|entry| entry.key().clone());
                match oldest {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        self.entries.insert(
            key,
            CachedEntry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn clear_expired(&self) {
        self.entries.retain(|_, entry| entry.cached_at.elapsed() < self.config.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Oracle wrapper that answers repeated evaluations of the same transaction from memory.
#[derive(Debug)]
pub struct CachingOracle<O> {
    inner: O,
    cache: TtlCache<[u8; 32], Vec<EvaluatedRedeemer>>,
}

impl<O> CachingOracle<O> {
    pub fn new(inner: O, config: CacheConfig) -> Self {
        Self {
            inner,
            cache: TtlCache::new(config),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<O: ScriptEvaluationOracle> ScriptEvaluationOracle for CachingOracle<O> {
    async fn evaluate(&self, tx: &[u8]) -> Result<Vec<EvaluatedRedeemer>, EvaluationError> {
        let key = blake2b_256(tx);
        if let Some(hit) = self.cache.get(&key) {
            debug!("evaluation cache hit for {}", hex::encode(key));
            return Ok(hit);
        }
        let result = self.inner.evaluate(tx).await?;
        self.cache.insert(key, result.clone());
        Ok(result)
    }
}
