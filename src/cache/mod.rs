//! Cache-aside wrapper over three in-process TTL tiers.
//!
//! Values are stored as JSON so one store serves every cached response type.
//! Errors from the compute closure are never stored.

use moka::sync::Cache;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{future::Future, sync::Arc, time::Duration};
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::WorkbenchError;

type TierStore = Cache<String, Arc<Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Health metrics.
    Short,
    /// Settings.
    Medium,
    /// Provider listing, remote MCP catalog.
    Long,
}

#[derive(Clone)]
pub struct CacheLayer {
    enabled: bool,
    short: TierStore,
    medium: TierStore,
    long: TierStore,
}

fn build_tier(ttl_secs: u64, max_capacity: u64) -> TierStore {
    Cache::builder()
        .time_to_live(Duration::from_secs(ttl_secs))
        .max_capacity(max_capacity)
        .build()
}

impl CacheLayer {
    pub fn new(cfg: &CacheConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            short: build_tier(cfg.short_ttl_secs, cfg.max_capacity),
            medium: build_tier(cfg.medium_ttl_secs, cfg.max_capacity),
            long: build_tier(cfg.long_ttl_secs, cfg.max_capacity),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn store(&self, tier: CacheTier) -> &TierStore {
        match tier {
            CacheTier::Short => &self.short,
            CacheTier::Medium => &self.medium,
            CacheTier::Long => &self.long,
        }
    }

    /// Returns the cached value for `key`, or runs `compute` and caches its `Ok` result.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        tier: CacheTier,
        key: &str,
        compute: F,
    ) -> Result<T, WorkbenchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, WorkbenchError>>,
    {
        if !self.enabled {
            return compute().await;
        }

        let store = self.store(tier);
        if let Some(cached) = store.get(key) {
            match T::deserialize(cached.as_ref()) {
                Ok(value) => {
                    debug!(?tier, key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    debug!(?tier, key, error = %e, "cached value has a different shape; recomputing");
                    store.invalidate(key);
                }
            }
        }

        let value = compute().await?;
        match serde_json::to_value(&value) {
            Ok(json) => store.insert(key.to_string(), Arc::new(json)),
            Err(e) => debug!(?tier, key, error = %e, "value not cacheable"),
        }
        debug!(?tier, key, "cache miss stored");
        Ok(value)
    }

    pub fn invalidate(&self, tier: CacheTier, key: &str) {
        self.store(tier).invalidate(key);
    }

    /// Total live entries across all tiers.
    pub fn entry_count(&self) -> u64 {
        [&self.short, &self.medium, &self.long]
            .into_iter()
            .map(|store| {
                store.run_pending_tasks();
                store.entry_count()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn layer() -> CacheLayer {
        CacheLayer::new(&CacheConfig::default())
    }

    #[tokio::test]
    async fn hit_skips_compute() {
        let cache = layer();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_compute(CacheTier::Long, "providers", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["openai".to_string()])
                })
                .await
                .expect("compute ok");
            assert_eq!(value, vec!["openai".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = layer();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let first: Result<u32, _> = cache
            .get_or_compute(CacheTier::Short, "metrics", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(WorkbenchError::UnexpectedError("db down".to_string()))
            })
            .await;
        assert!(first.is_err());

        let second: u32 = cache
            .get_or_compute(CacheTier::Short, "metrics", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .expect("second compute ok");

        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let cache = layer();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = || async move { Ok(calls.fetch_add(1, Ordering::SeqCst)) };

        let first: Option<usize> = cache
            .get_or_compute(CacheTier::Medium, "settings", compute)
            .await
            .ok();
        let cached: Option<usize> = cache
            .get_or_compute(CacheTier::Medium, "settings", compute)
            .await
            .ok();
        cache.invalidate(CacheTier::Medium, "settings");
        let recomputed: Option<usize> = cache
            .get_or_compute(CacheTier::Medium, "settings", compute)
            .await
            .ok();

        assert_eq!((first, cached, recomputed), (Some(0), Some(0), Some(1)));
    }

    #[tokio::test]
    async fn tiers_do_not_share_keys() {
        let cache = layer();
        let a: u32 = cache
            .get_or_compute(CacheTier::Short, "k", || async { Ok(1) })
            .await
            .expect("short");
        let b: u32 = cache
            .get_or_compute(CacheTier::Long, "k", || async { Ok(2) })
            .await
            .expect("long");
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn disabled_cache_always_computes() {
        let cache = CacheLayer::new(&CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let _: u32 = cache
                .get_or_compute(CacheTier::Long, "k", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await
                .expect("compute ok");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.entry_count(), 0);
    }
}
