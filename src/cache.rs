use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};

/// How long lookup results stay cached.
pub const DEFAULT_CACHE_EXPIRATION: Duration = Duration::from_secs(12 * 60 * 60);

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct Entry {
    payload: String,
    ttl: Duration,
}

struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Opaque get/set store for serialized lookup results.
///
/// The store owns the cached values for their lifetime; callers only
/// read and write through it and hold no long-lived reference. Entries
/// expire per the TTL given at insertion.
#[derive(Clone)]
pub struct CacheStore {
    entries: Cache<String, Entry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();
        Self { entries }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).await.map(|entry| entry.payload)
    }

    pub async fn set(&self, key: &str, payload: String, ttl: Duration) {
        self.entries
            .insert(key.to_string(), Entry { payload, ttl })
            .await;
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a stable cache key from an identifier and auxiliary lookup
/// parameters, under a per-entity-kind prefix so different kinds never
/// collide. Parameters are joined in the order given; callers with
/// unordered lists (includes, release types) sort them first.
pub fn prep_cache_key(prefix: &str, id: &str, params: &[String]) -> String {
    if params.is_empty() {
        format!("{prefix}:{id}")
    } else {
        format!("{prefix}:{id}:{}", params.join(","))
    }
}
