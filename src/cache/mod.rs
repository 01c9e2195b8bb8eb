// src/cache/mod.rs

//! Namespaced in-memory cache with TTL and LRU eviction.
//!
//! Entries are JSON values grouped into per-namespace stores. Each store
//! bounds its own entry count and total serialized size; when either limit
//! is exceeded the namespace's least recently used entry goes first, so
//! filling one namespace never evicts another's entries. Async factories
//! compute missing values without holding the lock, so concurrent lookups
//! never block on each other's computation.

use crate::error::{Error, Result};
use crate::hash::sha256;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Keys longer than this are replaced by their SHA-256 hex digest
const MAX_KEY_LEN: usize = 250;

/// Serialized-size fallback for values that fail to serialize
const FALLBACK_ENTRY_SIZE: u64 = 1024;

/// Cache tuning knobs, applied per namespace
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in one namespace
    pub max_items: usize,
    /// Time after which an entry is considered stale
    pub ttl: Duration,
    /// Maximum total serialized size of one namespace's values
    pub max_size_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_items: 1000,
            ttl: Duration::from_secs(15 * 60),
            max_size_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Point-in-time cache counters, aggregated across namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub size_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in percent; 100 when the cache was never queried
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            100.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    size: u64,
    inserted: Instant,
    last_access: Instant,
    hits: u64,
}

/// One namespace's entries and their byte accounting
#[derive(Debug, Default)]
struct Store {
    entries: HashMap<String, Entry>,
    size_bytes: u64,
}

impl Store {
    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.size_bytes -= entry.size;
        Some(entry)
    }
}

#[derive(Default)]
struct Inner {
    stores: HashMap<String, Store>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Namespaced LRU cache for computed context artifacts
pub struct ContextCache {
    config: CacheConfig,
    // Never held across an await point.
    inner: Mutex<Inner>,
}

impl ContextCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    fn store_key(key: &str) -> String {
        if key.len() > MAX_KEY_LEN {
            sha256(key.as_bytes())
        } else {
            key.to_string()
        }
    }

    fn entry_size(value: &Value) -> u64 {
        serde_json::to_vec(value)
            .map(|v| v.len() as u64)
            .unwrap_or(FALLBACK_ENTRY_SIZE)
    }

    /// Look up a value, refreshing its recency and per-entry hit count.
    /// Expired entries are removed and count as misses.
    pub fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let store_key = Self::store_key(key);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(store) = inner.stores.get_mut(namespace) else {
            inner.misses += 1;
            return None;
        };

        match store.entries.get_mut(&store_key) {
            Some(entry) if entry.inserted.elapsed() <= self.config.ttl => {
                entry.hits += 1;
                entry.last_access = Instant::now();
                let value = entry.value.clone();
                inner.hits += 1;
                Some(value)
            }
            Some(_) => {
                debug!("cache entry expired: {}:{}", namespace, store_key);
                store.remove(&store_key);
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a value, evicting the namespace's least-recently-used entries
    /// as needed
    pub fn set(&self, namespace: &str, key: &str, value: Value) {
        let store_key = Self::store_key(key);
        let size = Self::entry_size(&value);
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let store = inner.stores.entry(namespace.to_string()).or_default();
        store.remove(&store_key);
        store.entries.insert(
            store_key,
            Entry {
                value,
                size,
                inserted: now,
                last_access: now,
                hits: 0,
            },
        );
        store.size_bytes += size;

        // Caps apply within the namespace only.
        while store.entries.len() > self.config.max_items
            || store.size_bytes > self.config.max_size_bytes
        {
            let lru = store
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone());
            match lru {
                Some(key) => {
                    debug!("evicting cache entry: {}:{}", namespace, key);
                    store.remove(&key);
                    inner.evictions += 1;
                }
                None => break,
            }
        }
    }

    /// Return the cached value or compute and store it.
    ///
    /// The factory runs without the cache lock held; its error propagates
    /// and nothing is stored on failure.
    pub async fn get_or_compute<F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        factory: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(value) = self.get(namespace, key) {
            return Ok(value);
        }

        let value = factory().await?;
        self.set(namespace, key, value.clone());
        Ok(value)
    }

    /// Cache a function result keyed by its name and serialized arguments
    pub async fn memoize<A, F, Fut>(
        &self,
        namespace: &str,
        function: &str,
        args: &A,
        factory: F,
    ) -> Result<Value>
    where
        A: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let args = serde_json::to_string(args)
            .map_err(|e| Error::Cache(format!("unserializable memoize arguments: {}", e)))?;
        let key = format!("{}({})", function, args);
        self.get_or_compute(namespace, &key, factory).await
    }

    /// Populate a set of keys up front.
    ///
    /// Factories run concurrently; individual failures are logged and
    /// skipped rather than aborting the batch. Returns the number of
    /// entries actually stored.
    pub async fn warm_up<F, Fut>(&self, namespace: &str, entries: Vec<(String, F)>) -> usize
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let tasks = entries.into_iter().map(|(key, factory)| async move {
            let result = factory().await;
            (key, result)
        });

        let mut stored = 0;
        for (key, result) in futures::future::join_all(tasks).await {
            match result {
                Ok(value) => {
                    self.set(namespace, &key, value);
                    stored += 1;
                }
                Err(e) => warn!("cache warm-up failed for {}:{}: {}", namespace, key, e),
            }
        }
        debug!("warmed up {} entries in namespace {}", stored, namespace);
        stored
    }

    /// Remove one entry
    pub fn invalidate(&self, namespace: &str, key: &str) {
        let store_key = Self::store_key(key);
        let mut inner = self.inner.lock();
        if let Some(store) = inner.stores.get_mut(namespace) {
            store.remove(&store_key);
        }
    }

    /// Remove every entry in a namespace
    pub fn clear_namespace(&self, namespace: &str) {
        self.inner.lock().stores.remove(namespace);
    }

    /// Drop all entries; counters keep accumulating
    pub fn clear(&self) {
        self.inner.lock().stores.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.stores.values().map(|s| s.entries.len()).sum(),
            size_bytes: inner.stores.values().map(|s| s.size_bytes).sum(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let cache = ContextCache::with_defaults();
        cache.set("contexts", "a", json!({"x": 1}));

        assert_eq!(cache.get("contexts", "a"), Some(json!({"x": 1})));
        assert_eq!(cache.get("contexts", "missing"), None);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let cache = ContextCache::with_defaults();
        cache.set("contexts", "a", json!(1));
        cache.set("reports", "a", json!(2));

        assert_eq!(cache.get("contexts", "a"), Some(json!(1)));
        assert_eq!(cache.get("reports", "a"), Some(json!(2)));

        cache.clear_namespace("contexts");
        assert_eq!(cache.get("contexts", "a"), None);
        assert_eq!(cache.get("reports", "a"), Some(json!(2)));
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = ContextCache::new(CacheConfig {
            ttl: Duration::from_millis(0),
            ..Default::default()
        });
        cache.set("contexts", "a", json!(1));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(cache.get("contexts", "a"), None);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_lru_eviction_on_count() {
        let cache = ContextCache::new(CacheConfig {
            max_items: 2,
            ..Default::default()
        });
        cache.set("n", "a", json!(1));
        std::thread::sleep(Duration::from_millis(2));
        cache.set("n", "b", json!(2));
        std::thread::sleep(Duration::from_millis(2));

        // Touch "a" so "b" becomes least recently used.
        cache.get("n", "a");
        std::thread::sleep(Duration::from_millis(2));
        cache.set("n", "c", json!(3));

        assert_eq!(cache.get("n", "a"), Some(json!(1)));
        assert_eq!(cache.get("n", "b"), None);
        assert_eq!(cache.get("n", "c"), Some(json!(3)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_is_per_namespace() {
        let cache = ContextCache::new(CacheConfig {
            max_items: 2,
            ..Default::default()
        });
        cache.set("a", "only", json!("keep"));
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b", "one", json!(1));
        cache.set("b", "two", json!(2));
        cache.set("b", "three", json!(3));

        // Namespace "b" overflowed and evicted within itself; "a" is intact.
        assert_eq!(cache.get("a", "only"), Some(json!("keep")));
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.stats().entries, 3);
    }

    #[test]
    fn test_size_limit_evicts() {
        let cache = ContextCache::new(CacheConfig {
            max_size_bytes: 64,
            ..Default::default()
        });
        cache.set("n", "a", json!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        std::thread::sleep(Duration::from_millis(2));
        cache.set("n", "b", json!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"));

        let stats = cache.stats();
        assert!(stats.size_bytes <= 64);
        assert_eq!(stats.evictions, 1);
        assert_eq!(cache.get("n", "b"), Some(json!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb")));
    }

    #[test]
    fn test_long_keys_are_hashed() {
        let cache = ContextCache::with_defaults();
        let long_key = "k".repeat(400);
        cache.set("n", &long_key, json!(42));

        assert_eq!(cache.get("n", &long_key), Some(json!(42)));
        // The stored key is the digest, not the raw 400-char key.
        let inner = cache.inner.lock();
        let store = inner.stores.get("n").unwrap();
        assert!(store.entries.keys().all(|k| k.len() == 64));
    }

    #[test]
    fn test_per_entry_hit_count() {
        let cache = ContextCache::with_defaults();
        cache.set("n", "hot", json!(1));
        cache.set("n", "cold", json!(2));
        cache.get("n", "hot");
        cache.get("n", "hot");
        cache.get("n", "hot");

        let inner = cache.inner.lock();
        let store = inner.stores.get("n").unwrap();
        assert_eq!(store.entries.get("hot").unwrap().hits, 3);
        assert_eq!(store.entries.get("cold").unwrap().hits, 0);
    }

    #[test]
    fn test_stats_and_hit_rate() {
        let cache = ContextCache::with_defaults();
        cache.set("n", "a", json!(1));
        cache.get("n", "a");
        cache.get("n", "a");
        cache.get("n", "missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0 * 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_get_or_compute_runs_factory_once() {
        let cache = ContextCache::with_defaults();

        let first = cache
            .get_or_compute("n", "k", || async { Ok(json!("computed")) })
            .await
            .unwrap();
        assert_eq!(first, json!("computed"));

        // Second call must hit the cache and leave the factory unused.
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let second = cache
            .get_or_compute("n", "k", || async {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(json!("recomputed"))
            })
            .await
            .unwrap();
        assert_eq!(second, json!("computed"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_or_compute_propagates_errors() {
        let cache = ContextCache::with_defaults();

        let result = cache
            .get_or_compute("n", "k", || async {
                Err(Error::Cache("backend unavailable".to_string()))
            })
            .await;
        assert!(result.is_err());
        // Nothing is stored on failure.
        assert_eq!(cache.get("n", "k"), None);
    }

    #[tokio::test]
    async fn test_memoize_distinguishes_arguments() {
        let cache = ContextCache::with_defaults();

        let a = cache
            .memoize("n", "square", &2, || async { Ok(json!(4)) })
            .await
            .unwrap();
        let b = cache
            .memoize("n", "square", &3, || async { Ok(json!(9)) })
            .await
            .unwrap();
        assert_eq!(a, json!(4));
        assert_eq!(b, json!(9));
        assert_eq!(cache.stats().entries, 2);
    }

    #[tokio::test]
    async fn test_warm_up_skips_failures() {
        let cache = ContextCache::with_defaults();

        let entries: Vec<_> = vec![
            ("good".to_string(), Ok(json!(1))),
            ("bad".to_string(), Err(Error::Cache("boom".to_string()))),
        ]
        .into_iter()
        .map(|(key, result)| (key, move || async move { result }))
        .collect();

        let stored = cache.warm_up("n", entries).await;

        assert_eq!(stored, 1);
        assert_eq!(cache.get("n", "good"), Some(json!(1)));
        assert_eq!(cache.get("n", "bad"), None);
    }
}
