//! In-memory explanation cache
//!
//! Memoizes explanations by [`AnomalyIdentity`] for the lifetime of a session
//! so that re-rendering an analysis never re-spends remote-call budget:
//!
//! - at most one computation per identity, even under concurrent lookups
//! - concurrent callers on the same identity await the first computation
//! - distinct identities never wait on each other
//!
//! # Example
//!
//! ```rust,ignore
//! use trendlens::cache::ExplanationCache;
//!
//! let cache = ExplanationCache::new();
//! let explanation = cache
//!     .get_or_compute(identity, || async { expensive_explanation().await })
//!     .await;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

use crate::models::{normalize_keyword, AnomalyIdentity, Explanation};

type Slot = Arc<OnceCell<Explanation>>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served without computing
    pub hits: u64,
    /// Lookups that ran the compute function
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Session-scoped memoization of explanations
#[derive(Debug, Default)]
pub struct ExplanationCache {
    entries: Mutex<HashMap<AnomalyIdentity, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExplanationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<AnomalyIdentity, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached explanation for `identity`, computing it on first use
    ///
    /// The map lock is only held to find the slot; computation happens
    /// outside it, so unrelated identities proceed in parallel.
    pub async fn get_or_compute<F, Fut>(&self, identity: AnomalyIdentity, compute: F) -> Explanation
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Explanation>,
    {
        let slot = Arc::clone(self.entries().entry(identity.clone()).or_default());

        let mut computed = false;
        let explanation = slot
            .get_or_init(|| {
                computed = true;
                compute()
            })
            .await
            .clone();

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(anomaly = %identity, "Explanation cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(anomaly = %identity, "Explanation cache hit");
        }

        explanation
    }

    /// Cached explanation for `identity`, if one has been computed
    pub fn get(&self, identity: &AnomalyIdentity) -> Option<Explanation> {
        self.entries()
            .get(identity)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of computed explanations
    pub fn len(&self) -> usize {
        self.entries()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry belonging to `keyword`, returning how many were removed
    pub fn invalidate_keyword(&self, keyword: &str) -> usize {
        let keyword = normalize_keyword(keyword);
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|identity, _| identity.keyword != keyword);
        before - entries.len()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Snapshot of hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, ExplanationSource};
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn identity(keyword: &str, day: u32) -> AnomalyIdentity {
        AnomalyIdentity::new(
            keyword,
            NaiveDate::from_ymd_opt(2023, 5, day).unwrap(),
            Direction::Spike,
        )
    }

    fn explanation(identity: &AnomalyIdentity, text: &str) -> Explanation {
        Explanation::new(identity.clone(), text, ExplanationSource::Live)
    }

    #[tokio::test]
    async fn test_computes_once_per_key() {
        let cache = ExplanationCache::new();
        let counter = AtomicU32::new(0);
        let key = identity("rust", 7);

        for _ in 0..2 {
            let result = cache
                .get_or_compute(key.clone(), || async {
                    counter.fetch_add(1, Ordering::SeqCst);
                    explanation(&key, "first")
                })
                .await;
            assert_eq!(result.text, "first");
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_keyword_case_shares_entry() {
        let cache = ExplanationCache::new();
        let counter = AtomicU32::new(0);

        for keyword in ["Rust", "rust "] {
            let key = identity(keyword, 7);
            cache
                .get_or_compute(key.clone(), || async {
                    counter.fetch_add(1, Ordering::SeqCst);
                    explanation(&key, "x")
                })
                .await;
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_collapses() {
        let cache = Arc::new(ExplanationCache::new());
        let counter = Arc::new(AtomicU32::new(0));
        let key = identity("rust", 14);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let counter = Arc::clone(&counter);
                let key = key.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_compute(key.clone(), || async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            explanation(&key, "shared")
                        })
                        .await
                })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            assert_eq!(task.unwrap().text, "shared");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let cache = Arc::new(ExplanationCache::new());
        let (a, b) = (identity("rust", 1), identity("rust", 8));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let slow = tokio::spawn({
            let cache = Arc::clone(&cache);
            let a = a.clone();
            async move {
                cache
                    .get_or_compute(a.clone(), || async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        explanation(&a, "slow")
                    })
                    .await
            }
        });

        // The slow computation is now in flight on its own slot
        started_rx.await.unwrap();

        let fast = tokio::time::timeout(
            Duration::from_secs(1),
            cache.get_or_compute(b.clone(), || async { explanation(&b, "fast") }),
        )
        .await
        .expect("distinct key waited on an unrelated computation");

        assert_eq!(fast.text, "fast");
        assert!(!slow.is_finished());
        assert!(cache.get(&a).is_none());

        release_tx.send(()).unwrap();
        assert_eq!(slow.await.unwrap().text, "slow");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_keyword() {
        let cache = ExplanationCache::new();
        for (keyword, day) in [("rust", 1), ("rust", 8), ("go", 1)] {
            let key = identity(keyword, day);
            cache
                .get_or_compute(key.clone(), || async { explanation(&key, "x") })
                .await;
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.invalidate_keyword("RUST"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&identity("go", 1)).is_some());
        assert!(cache.get(&identity("rust", 1)).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
