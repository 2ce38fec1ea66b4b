//! Catalog cache.
//!
//! Two caches share one [`CacheStore`]:
//!
//! - **Entity cache**: one [`FilmRecord`](crate::domain::entities::FilmRecord) per film id
//! - **Query-result cache**: the ordered ids and continuation token of one page
//!
//! The index stays the source of truth. Every cache failure degrades to a
//! miss, so a broken store slows responses down but never changes them.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! key_prefix = "cinema:"
//! film_ttl_seconds = 300
//! query_ttl_seconds = 300
//! memory_capacity = 10000
//! ```

mod codec;
mod config;
mod entity;
mod keys;
pub(crate) mod lock;
mod query;
mod store;
mod typed;

use std::sync::Arc;

pub use codec::{CodecError, decode, encode};
pub use config::{CacheConfig, MAX_TTL_SECS};
pub use entity::EntityCache;
pub use keys::{CACHE_SCHEMA_VERSION, CacheKeys, CacheSubject};
pub use query::QueryResultCache;
pub use store::{CacheStore, MemoryStore, StoreError};

pub const METRIC_CACHE_HIT_TOTAL: &str = "catalog_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "catalog_cache_miss_total";
pub const METRIC_CACHE_MALFORMED_TOTAL: &str = "catalog_cache_malformed_total";
pub const METRIC_CACHE_STORE_ERROR_TOTAL: &str = "catalog_cache_store_error_total";
pub const METRIC_CACHE_QUERY_STALE_TOTAL: &str = "catalog_cache_query_stale_total";

/// Both caches over a single store.
#[derive(Clone)]
pub struct CatalogCache {
    films: EntityCache,
    queries: QueryResultCache,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        let keys = CacheKeys::new(config.key_prefix.clone());
        Self {
            films: EntityCache::new(store.clone(), keys.clone(), config.film_ttl()),
            queries: QueryResultCache::new(store, keys, config.query_ttl()),
        }
    }

    pub fn films(&self) -> &EntityCache {
        &self.films
    }

    pub fn queries(&self) -> &QueryResultCache {
        &self.queries
    }
}
