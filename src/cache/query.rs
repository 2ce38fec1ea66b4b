//! Query-result cache: the ordered film ids of one normalized page.

use std::sync::Arc;
use std::time::Duration;

use super::keys::CacheKeys;
use super::store::CacheStore;
use super::typed;
use crate::application::pagination::CursorResult;
use crate::application::query::QueryParameters;

const CACHE_LABEL: &str = "query";

#[derive(Clone)]
pub struct QueryResultCache {
    store: Arc<dyn CacheStore>,
    keys: CacheKeys,
    ttl: Duration,
}

impl QueryResultCache {
    pub fn new(store: Arc<dyn CacheStore>, keys: CacheKeys, ttl: Duration) -> Self {
        Self { store, keys, ttl }
    }

    pub fn key_for(&self, params: &QueryParameters) -> String {
        self.keys.compose(params)
    }

    pub async fn get(&self, params: &QueryParameters) -> Option<CursorResult> {
        typed::read(self.store.as_ref(), &self.key_for(params), CACHE_LABEL).await
    }

    /// Store a page projection, replacing whatever the key held.
    pub async fn put(&self, params: &QueryParameters, result: &CursorResult) {
        typed::write(
            self.store.as_ref(),
            &self.key_for(params),
            result,
            self.ttl,
            CACHE_LABEL,
        )
        .await;
    }
}
