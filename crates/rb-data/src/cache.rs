use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rb_types::PortfolioId;
use serde::{Deserialize, Serialize};
use tracing::debug;

// chrono::Duration panics above i64::MAX milliseconds
const MAX_TTL_SECONDS: u64 = (i64::MAX / 1_000) as u64;

/// Limits for a [`PortfolioCache`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of portfolios kept before LRU eviction.
    pub max_entries: usize,
    /// Entries older than this are refetched. `None` keeps entries until
    /// evicted or invalidated.
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 32,
            ttl_seconds: Some(300),
        }
    }
}

/// Cached value with metadata
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    stored_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        let now = Utc::now();
        Self {
            value,
            stored_at: now,
            last_accessed: now,
        }
    }

    fn access(&mut self) {
        self.last_accessed = Utc::now();
    }

    fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        match ttl {
            Some(ttl) => now - self.stored_at >= ttl,
            None => false,
        }
    }
}

/// In-memory cache of per-portfolio data, keyed by portfolio id.
///
/// Entries expire after the configured TTL and the least recently used entry
/// is evicted when the cache is full.
#[derive(Debug)]
pub struct PortfolioCache<T> {
    cache: DashMap<PortfolioId, RwLock<CacheEntry<T>>>,
    max_entries: usize,
    ttl: Option<Duration>,
    stats: RwLock<CacheStats>,
}

impl<T: Clone> PortfolioCache<T> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            max_entries: config.max_entries.max(1),
            ttl: config
                .ttl_seconds
                .map(|secs| Duration::seconds(secs.min(MAX_TTL_SECONDS) as i64)),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn get(&self, portfolio: &PortfolioId) -> Option<T> {
        let now = Utc::now();
        let mut expired = false;

        if let Some(entry_lock) = self.cache.get(portfolio) {
            let mut entry = entry_lock.write();

            if entry.is_expired(self.ttl, now) {
                expired = true;
            } else {
                entry.access();
                self.stats.write().hits += 1;
                return Some(entry.value.clone());
            }
        }

        // The map guard must be released before removing from the same shard.
        if expired {
            self.cache.remove(portfolio);
            self.stats.write().expirations += 1;
            debug!(portfolio = %portfolio, "cache entry expired");
        }

        self.stats.write().misses += 1;
        None
    }

    pub fn insert(&self, portfolio: PortfolioId, value: T) {
        if !self.cache.contains_key(&portfolio) && self.cache.len() >= self.max_entries {
            self.evict_lru();
        }

        self.cache.insert(portfolio, RwLock::new(CacheEntry::new(value)));
        self.stats.write().stores += 1;
    }

    /// Drop the entry for `portfolio`. Returns true if one was present.
    pub fn invalidate(&self, portfolio: &PortfolioId) -> bool {
        let removed = self.cache.remove(portfolio).is_some();
        if removed {
            self.stats.write().invalidations += 1;
        }
        removed
    }

    pub fn contains(&self, portfolio: &PortfolioId) -> bool {
        self.cache.contains_key(portfolio)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
        *self.stats.write() = CacheStats::default();
    }

    pub fn get_stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Evict the least recently used tenth of the entries, at least one
    fn evict_lru(&self) {
        let entries_to_remove = (self.cache.len() / 10).max(1);
        let mut candidates: Vec<(PortfolioId, DateTime<Utc>)> = self
            .cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().read().last_accessed))
            .collect();

        candidates.sort_by(|a, b| a.1.cmp(&b.1));

        for (key, _) in candidates.into_iter().take(entries_to_remove) {
            if self.cache.remove(&key).is_some() {
                self.stats.write().evictions += 1;
                debug!(portfolio = %key, "evicted least recently used cache entry");
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}
