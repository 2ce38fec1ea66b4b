//! Entity cache: one film record per key.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::keys::CacheKeys;
use super::store::CacheStore;
use super::typed;
use crate::domain::entities::FilmRecord;

const CACHE_LABEL: &str = "film";

#[derive(Clone)]
pub struct EntityCache {
    store: Arc<dyn CacheStore>,
    keys: CacheKeys,
    ttl: Duration,
}

impl EntityCache {
    pub fn new(store: Arc<dyn CacheStore>, keys: CacheKeys, ttl: Duration) -> Self {
        Self { store, keys, ttl }
    }

    /// Look up a film. Absent, unreadable and unreachable entries all read as `None`.
    pub async fn get(&self, id: Uuid) -> Option<FilmRecord> {
        let key = self.keys.compose(&id);
        typed::read(self.store.as_ref(), &key, CACHE_LABEL).await
    }

    pub async fn put(&self, film: &FilmRecord) {
        let key = self.keys.compose(&film.id);
        typed::write(self.store.as_ref(), &key, film, self.ttl, CACHE_LABEL).await;
    }
}
