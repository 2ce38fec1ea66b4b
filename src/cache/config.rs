//! Cache configuration.
//!
//! Controls the entity and query-result caches via `cinema.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_KEY_PREFIX: &str = "cinema:";
const DEFAULT_FILM_TTL_SECS: u64 = 60 * 5;
const DEFAULT_QUERY_TTL_SECS: u64 = 60 * 5;
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;
/// Longest lifetime any cache entry may be given: 30 days.
pub const MAX_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Cache configuration from `cinema.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Consult and populate the cache at all.
    pub enabled: bool,
    /// Namespace prepended to every key written to the shared store.
    pub key_prefix: String,
    /// Lifetime of a cached film record.
    pub film_ttl_secs: u64,
    /// Lifetime of a cached page of film identifiers.
    pub query_ttl_secs: u64,
    /// Maximum entries held by the in-process store.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            film_ttl_secs: DEFAULT_FILM_TTL_SECS,
            query_ttl_secs: DEFAULT_QUERY_TTL_SECS,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            key_prefix: settings.key_prefix.clone(),
            film_ttl_secs: settings.film_ttl.as_secs(),
            query_ttl_secs: settings.query_ttl.as_secs(),
            memory_capacity: settings.memory_capacity.get(),
        }
    }
}

impl CacheConfig {
    /// TTL of film entries, between one second and [`MAX_TTL_SECS`].
    pub fn film_ttl(&self) -> Duration {
        Duration::from_secs(self.film_ttl_secs.clamp(1, MAX_TTL_SECS))
    }

    /// TTL of query-result entries, between one second and [`MAX_TTL_SECS`].
    pub fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_secs.clamp(1, MAX_TTL_SECS))
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
