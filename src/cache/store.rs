//! Cache store port and the in-process store.
//!
//! The store is best-effort: callers treat every error as a miss.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;

use super::config::CacheConfig;
use super::lock::{read_or_recover, write_or_recover};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {message}")]
    Unavailable { message: String },
    #[error("cache store is closed")]
    Closed,
    #[error("ttl of {ttl:?} is out of range")]
    TtlOutOfRange { ttl: Duration },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Byte-oriented key/value store with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}

struct MemoryEntry {
    value: Bytes,
    expires_at: Instant,
}

/// LRU-bounded in-process store with TTL expiry.
///
/// Used when no shared store is configured, and in tests.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, MemoryEntry>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.memory_capacity_non_zero())),
            closed: AtomicBool::new(false),
        }
    }

    /// Get the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        read_or_recover(&self.entries, SOURCE, "len").len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.ensure_open()?;
        let mut entries = write_or_recover(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        self.ensure_open()?;
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or(StoreError::TtlOutOfRange { ttl })?;
        let entry = MemoryEntry { value, expires_at };
        write_or_recover(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        write_or_recover(&self.entries, SOURCE, "close").clear();
        Ok(())
    }
}
