//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cinema_catalog::application::catalog::CatalogService;
use cinema_catalog::application::index::{IndexError, SearchIndex};
use cinema_catalog::application::pagination::CursorPage;
use cinema_catalog::application::query::{FilmListRequest, QueryParameters};
use cinema_catalog::cache::{CacheConfig, CacheStore, CatalogCache, MemoryStore, StoreError};
use cinema_catalog::domain::entities::{FilmRecord, GenreInline};
use cinema_catalog::infra::memory_index::MemoryIndex;
use uuid::Uuid;

pub const SCI_FI: Uuid = Uuid::from_u128(0x61e08d13_e169_4a77_b286_458e66f1fb27);
pub const DRAMA: Uuid = Uuid::from_u128(0x1cacff68_643e_4ddd_8f57_84b62538081a);

pub fn film(title: &str, rating: f64, genres: &[Uuid]) -> FilmRecord {
    FilmRecord {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: Some(format!("{title} description")),
        imdb_rating: rating,
        genre: genres
            .iter()
            .map(|id| GenreInline {
                id: *id,
                name: if *id == SCI_FI { "Sci-Fi" } else { "Drama" }.to_string(),
            })
            .collect(),
        actors: None,
        writers: None,
        directors: None,
    }
}

pub fn catalog_films() -> Vec<FilmRecord> {
    vec![
        film("The Matrix", 8.7, &[SCI_FI]),
        film("The Matrix Reloaded", 7.2, &[SCI_FI]),
        film("Solaris", 8.1, &[SCI_FI, DRAMA]),
        film("Stalker", 8.0, &[SCI_FI, DRAMA]),
        film("Mirror", 8.1, &[DRAMA]),
        film("Alien", 8.5, &[SCI_FI]),
        film("Aliens", 8.4, &[SCI_FI]),
        film("Andrei Rublev", 8.1, &[DRAMA]),
        film("Blade Runner", 8.1, &[SCI_FI]),
        film("Ivan's Childhood", 8.0, &[DRAMA]),
        film("Gattaca", 7.8, &[SCI_FI, DRAMA]),
        film("Moon", 7.8, &[SCI_FI, DRAMA]),
        film("Arrival", 7.9, &[SCI_FI, DRAMA]),
    ]
}

pub fn params(request: FilmListRequest) -> QueryParameters {
    QueryParameters::normalize(&request).expect("valid request")
}

/// [`MemoryIndex`] that counts calls and can be switched off, or made to
/// refuse every search the way Elasticsearch answers a bad `search_after`.
#[derive(Default)]
pub struct CountingIndex {
    pub inner: MemoryIndex,
    pub find_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    down: AtomicBool,
    refusing: AtomicBool,
}

impl CountingIndex {
    pub fn with_films(films: impl IntoIterator<Item = FilmRecord>) -> Self {
        Self {
            inner: MemoryIndex::with_films(films),
            ..Default::default()
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }

    pub fn finds(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), IndexError> {
        if self.down.load(Ordering::SeqCst) {
            Err(IndexError::unavailable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SearchIndex for CountingIndex {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FilmRecord>, IndexError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_by_id(id).await
    }

    async fn search(&self, params: &QueryParameters) -> Result<CursorPage<FilmRecord>, IndexError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.refusing.load(Ordering::SeqCst) {
            return Err(IndexError::rejected("failed to parse search_after value"));
        }
        self.inner.search(params).await
    }

    async fn ping(&self) -> Result<(), IndexError> {
        self.check()?;
        self.inner.ping().await
    }

    async fn close(&self) -> Result<(), IndexError> {
        self.inner.close().await
    }
}

/// Store whose every operation fails.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::unavailable("connection reset"))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::unavailable("connection reset"))
    }

    async fn close(&self) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection reset"))
    }
}

pub struct Harness {
    pub index: Arc<CountingIndex>,
    pub store: Arc<MemoryStore>,
    pub config: CacheConfig,
    pub service: CatalogService,
}

impl Harness {
    pub fn new(films: impl IntoIterator<Item = FilmRecord>) -> Self {
        let config = CacheConfig::default();
        let index = Arc::new(CountingIndex::with_films(films));
        let store = Arc::new(MemoryStore::new(&config));
        let service = CatalogService::new(
            index.clone(),
            Some(CatalogCache::new(store.clone(), &config)),
        );
        Self {
            index,
            store,
            config,
            service,
        }
    }
}
