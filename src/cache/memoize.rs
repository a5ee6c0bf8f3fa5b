//! Bounded memoization of asynchronous producers.
//!
//! [`Memoized`] wraps an async producer `Fn(A) -> Future<Output = Result<V>>`
//! and remembers successful results keyed on the argument tuple.
//!
//! # Keys
//!
//! The key is the JSON serialization of the arguments (`serde_json`), so
//! structurally equal arguments always map to the same entry. For the
//! artist catalog the arguments are `(artist_id, access_token)`: rotating the
//! token yields a fresh fetch instead of a stale hit.
//!
//! # Eviction
//!
//! Backed by moka configured with a strict LRU eviction policy. A hit marks
//! the entry most-recently-used; once the number of entries exceeds
//! `max_entries`, the least-recently-used one is evicted. Moka applies
//! recency updates and evictions in deferred batches, so every hit and
//! insert is flushed before [`Memoized::call`] returns; the table is exact
//! between calls.
//!
//! # Failures and concurrency
//!
//! A failed producer call propagates to the caller and stores nothing.
//!
//! In-flight misses are not coalesced: two concurrent calls with the same
//! key may both invoke the producer, so producers wrapped here must be
//! idempotent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use serde::Serialize;
use tracing::debug;

use crate::Result;
use crate::telemetry;

/// Default maximum number of memoized results.
pub const DEFAULT_MAX_ENTRIES: u64 = 10;

/// Configuration for a [`Memoized`] producer.
///
/// ```rust
/// # use tunemetrics::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(100)
///     .ttl(Duration::from_secs(900));
/// assert_eq!(config.max_entries, 100);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached results. Default: 10.
    pub max_entries: u64,
    /// Optional time-to-live for cached results. Default: none.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached results.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Expire results after `ttl` regardless of use.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

type Producer<A, V> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<V>> + Send + Sync>;

/// An async producer with a bounded LRU result cache in front of it.
///
/// Cloning is cheap and clones share the same entry table.
pub struct Memoized<A, V> {
    name: &'static str,
    producer: Producer<A, V>,
    entries: Cache<String, V>,
}

impl<A, V> Clone for Memoized<A, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            producer: Arc::clone(&self.producer),
            entries: self.entries.clone(),
        }
    }
}

impl<A, V> Memoized<A, V>
where
    A: Serialize + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Wrap `producer`. `name` labels log lines and cache metrics.
    pub fn new<F, Fut>(name: &'static str, config: &CacheConfig, producer: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut builder = Cache::<String, V>::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        let producer: Producer<A, V> = Arc::new(move |args| Box::pin(producer(args)));

        Self {
            name,
            producer,
            entries: builder.build(),
        }
    }

    /// Return the memoized result for `args`, invoking the producer on a miss.
    pub async fn call(&self, args: A) -> Result<V> {
        let key = serde_json::to_string(&args)?;

        if let Some(value) = self.entries.get(&key).await {
            self.entries.run_pending_tasks().await;
            debug!(cache = self.name, "memoized hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => self.name).increment(1);
            return Ok(value);
        }

        debug!(cache = self.name, "memoized miss");
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => self.name).increment(1);

        let value = (self.producer)(args).await?;
        self.entries.insert(key, value.clone()).await;
        self.entries.run_pending_tasks().await;
        Ok(value)
    }

    /// Whether a result for `args` is currently stored.
    ///
    /// Does not count as a use for LRU purposes.
    pub fn contains(&self, args: &A) -> bool {
        serde_json::to_string(args)
            .map(|key| self.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Drop the stored result for `args`, if any.
    pub async fn invalidate(&self, args: &A) -> Result<()> {
        let key = serde_json::to_string(args)?;
        self.entries.invalidate(&key).await;
        self.entries.run_pending_tasks().await;
        Ok(())
    }

    /// Drop every stored result.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Number of stored results.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply deferred recency updates and evictions.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
