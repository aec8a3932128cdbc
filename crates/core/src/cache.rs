use dashmap::DashMap;
use std::future::Future;
use std::time::{Duration, Instant};

/// Operation name plus canonicalized arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: &'static str,
    pub args: String,
}

impl CacheKey {
    pub fn new(operation: &'static str, args: impl Into<String>) -> Self {
        Self {
            operation,
            args: args.into().trim().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_stale(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local TTL cache. Expired entries are swept on every write.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: DashMap<CacheKey, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|e| !e.is_stale(now))
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        let now = Instant::now();
        self.entries.retain(|_, e| !e.is_stale(now));
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Returns the fresh cached value or runs `compute`. Failures are not cached.
    ///
    /// No shard lock is held while computing, so two callers racing on a cold key
    /// may both compute; the later write wins.
    pub async fn get_or_compute<E, F, Fut>(&self, key: CacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            tracing::debug!(operation = key.operation, args = %key.args, "cache hit");
            return Ok(hit);
        }

        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drops expired entries and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_stale(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
