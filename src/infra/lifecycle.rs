//! Process-lifetime ownership of the search index and cache store clients.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::application::catalog::CatalogService;
use crate::application::index::{IndexError, SearchIndex};
use crate::cache::{CacheConfig, CacheStore, CatalogCache, MemoryStore, StoreError};
use crate::config::{ElasticSettings, Settings};

use super::elastic::ElasticIndex;
use super::error::InfraError;
use super::redis_store::RedisStore;

const SOURCE: &str = "infra::lifecycle::Backends";

/// Both backend clients, opened together and closed together.
pub struct Backends {
    index: Arc<dyn SearchIndex>,
    store: Option<Arc<dyn CacheStore>>,
    cache: CacheConfig,
}

impl Backends {
    /// Open the cache store, then the search index. A failing index closes
    /// the store before the error is returned.
    pub async fn start(settings: &Settings) -> Result<Self, InfraError> {
        let cache = CacheConfig::from(&settings.cache);
        let redis_url = settings.redis.url.clone();
        let elastic = settings.elastic.clone();
        let store_config = cache.clone();

        Self::start_with(
            cache,
            move || open_store(redis_url, store_config),
            move || open_index(elastic),
        )
        .await
    }

    pub async fn start_with<S, SF, I, IF>(
        cache: CacheConfig,
        open_store: S,
        open_index: I,
    ) -> Result<Self, InfraError>
    where
        S: FnOnce() -> SF,
        SF: Future<Output = Result<Option<Arc<dyn CacheStore>>, StoreError>>,
        I: FnOnce() -> IF,
        IF: Future<Output = Result<Arc<dyn SearchIndex>, IndexError>>,
    {
        let store = open_store().await?;

        match open_index().await {
            Ok(index) => {
                info!(
                    target = "cinema::infra::lifecycle",
                    cache_enabled = store.is_some(),
                    "backends started"
                );
                Ok(Self {
                    index,
                    store,
                    cache,
                })
            }
            Err(error) => {
                if let Some(store) = &store {
                    close_store(store.as_ref()).await;
                }
                Err(error.into())
            }
        }
    }

    pub fn index(&self) -> Arc<dyn SearchIndex> {
        self.index.clone()
    }

    pub fn store(&self) -> Option<Arc<dyn CacheStore>> {
        self.store.clone()
    }

    pub fn catalog(&self) -> CatalogService {
        let cache = self
            .store
            .clone()
            .map(|store| CatalogCache::new(store, &self.cache));
        CatalogService::new(self.index.clone(), cache)
    }

    /// Close both clients. Failures are logged; closing never stops halfway.
    pub async fn stop(self) {
        close_index(self.index.as_ref()).await;
        if let Some(store) = &self.store {
            close_store(store.as_ref()).await;
        }
        info!(target = "cinema::infra::lifecycle", "backends stopped");
    }
}

async fn close_index(index: &dyn SearchIndex) {
    if let Err(error) = index.close().await {
        warn!(
            target = "cinema::infra::lifecycle",
            source = SOURCE,
            error = %error,
            "failed to close search index client"
        );
    }
}

async fn close_store(store: &dyn CacheStore) {
    if let Err(error) = store.close().await {
        warn!(
            target = "cinema::infra::lifecycle",
            source = SOURCE,
            error = %error,
            "failed to close cache store"
        );
    }
}

async fn open_store(
    redis_url: Option<String>,
    config: CacheConfig,
) -> Result<Option<Arc<dyn CacheStore>>, StoreError> {
    if !config.enabled {
        info!(target = "cinema::infra::lifecycle", "cache disabled");
        return Ok(None);
    }
    let store: Arc<dyn CacheStore> = match redis_url {
        Some(url) => Arc::new(RedisStore::connect(&url).await?),
        None => {
            info!(
                target = "cinema::infra::lifecycle",
                capacity = config.memory_capacity,
                "no redis url configured; using in-process cache store"
            );
            Arc::new(MemoryStore::new(&config))
        }
    };
    Ok(Some(store))
}

async fn open_index(settings: ElasticSettings) -> Result<Arc<dyn SearchIndex>, IndexError> {
    let index = ElasticIndex::new(&settings)?;
    ready_or_closed(&index, settings.startup_retries, settings.startup_retry_delay).await?;
    info!(
        target = "cinema::infra::lifecycle",
        url = %settings.url,
        index = %settings.index,
        "search index reachable"
    );
    Ok(Arc::new(index))
}

/// Like [`wait_until_ready`], but an index that never answers is closed
/// before its error is returned.
async fn ready_or_closed(
    index: &dyn SearchIndex,
    attempts: NonZeroU32,
    delay: Duration,
) -> Result<(), IndexError> {
    let result = wait_until_ready(index, attempts, delay).await;
    if result.is_err() {
        close_index(index).await;
    }
    result
}

/// Ping the index until it answers, giving up after `attempts` tries.
pub async fn wait_until_ready(
    index: &dyn SearchIndex,
    attempts: NonZeroU32,
    delay: Duration,
) -> Result<(), IndexError> {
    let mut attempt = 1;
    loop {
        match index.ping().await {
            Ok(()) => return Ok(()),
            Err(error) if attempt >= attempts.get() => return Err(error),
            Err(error) => {
                warn!(
                    target = "cinema::infra::lifecycle",
                    attempt,
                    attempts = attempts.get(),
                    error = %error,
                    "search index not ready; retrying"
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}
