//! Read-through cache for trust scores.
//!
//! Keys are the serialized scoring inputs themselves. YAML keeps NaN and
//! infinities distinct from `null`, so two inputs share a key only when they
//! score identically. A miss computes the score through the supplied
//! closure, so a cached value is always the value the uncached computation
//! produced. One cache must only ever be used with one trust configuration.

use moka::future::Cache;
use serde::Serialize;
use std::time::Duration;

use crate::config::CacheSettings;

/// Which scoring function produced a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Classification,
    Qualification,
    Savings,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScoreKey {
    kind: ScoreKind,
    inputs: String,
}

/// Score cache using moka.
pub struct ScoreCache {
    cache: Cache<ScoreKey, f64>,
}

impl ScoreCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.max_entries, settings.ttl)
    }

    /// Return the cached score for these inputs, computing it on a miss.
    ///
    /// Inputs that cannot be serialized bypass the cache.
    pub async fn get_or_compute<T, F>(&self, kind: ScoreKind, inputs: &T, compute: F) -> f64
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> f64 + Send,
    {
        let inputs = match serde_yaml::to_string(inputs) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::debug!(kind = ?kind, error = %e, "Unserializable score inputs, bypassing cache");
                return compute();
            }
        };

        let key = ScoreKey { kind, inputs };
        self.cache.get_with(key, async move { compute() }).await
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ScoreCache {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}
