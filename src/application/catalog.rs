//! Catalog query service.
//!
//! Orchestrates the cache-aside flow for single films and film listings.
//! The index is the source of truth; the cache is consulted first and
//! repopulated after every index read.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, try_join_all};
use metrics::{counter, histogram};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::index::{IndexError, SearchIndex};
use crate::application::pagination::{CursorPage, CursorResult};
use crate::application::query::QueryParameters;
use crate::cache::{CatalogCache, METRIC_CACHE_QUERY_STALE_TOTAL};
use crate::domain::entities::FilmRecord;

pub const METRIC_INDEX_REQUEST_MS: &str = "catalog_index_request_ms";

const SOURCE: &str = "application::catalog::CatalogService";

/// Outcome of a catalog read.
///
/// Absence, a query the index refused and an unreachable index are
/// different answers and stay apart all the way to the transport.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// The index answered, but refused the query as asked.
    Rejected(IndexError),
    BackendUnavailable(IndexError),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Rejected(error) => Lookup::Rejected(error),
            Lookup::BackendUnavailable(error) => Lookup::BackendUnavailable(error),
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    index: Arc<dyn SearchIndex>,
    cache: Option<CatalogCache>,
}

impl CatalogService {
    /// `cache` is `None` when caching is disabled; every read then goes to the index.
    pub fn new(index: Arc<dyn SearchIndex>, cache: Option<CatalogCache>) -> Self {
        Self { index, cache }
    }

    pub async fn film(&self, id: Uuid) -> Lookup<FilmRecord> {
        match self.resolve(id).await {
            Ok(Some(film)) => Lookup::Found(film),
            Ok(None) => Lookup::NotFound,
            Err(error) => failed(error),
        }
    }

    /// List one page of films. An empty page is a valid answer, never `NotFound`.
    pub async fn films(&self, params: &QueryParameters) -> Lookup<CursorPage<FilmRecord>> {
        match self.list(params).await {
            Ok(page) => Lookup::Found(page),
            Err(error) => failed(error),
        }
    }

    async fn resolve(&self, id: Uuid) -> Result<Option<FilmRecord>, IndexError> {
        if let Some(cache) = &self.cache
            && let Some(film) = cache.films().get(id).await
        {
            return Ok(Some(film));
        }

        let found = timed("find_by_id", self.index.find_by_id(id)).await?;
        if let (Some(cache), Some(film)) = (&self.cache, &found) {
            cache.films().put(film).await;
        }
        Ok(found)
    }

    async fn list(&self, params: &QueryParameters) -> Result<CursorPage<FilmRecord>, IndexError> {
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.queries().get(params).await
        {
            match self.hydrate(&cached).await? {
                Some(items) => return Ok(CursorPage::new(items, cached.next_cursor)),
                None => {
                    warn!(
                        target = "cinema::cache",
                        source = SOURCE,
                        key = %cache.queries().key_for(params),
                        "cached page references films missing from the index; refreshing"
                    );
                    counter!(METRIC_CACHE_QUERY_STALE_TOTAL).increment(1);
                }
            }
        }

        let page = timed("search", self.index.search(params)).await?;
        debug!(
            target = "cinema::catalog",
            hits = page.items.len(),
            has_next = page.next_cursor.is_some(),
            "index search completed"
        );

        if let Some(cache) = &self.cache {
            let projection = CursorResult::project(&page, |film| film.id);
            cache.queries().put(params, &projection).await;
            join_all(page.items.iter().map(|film| cache.films().put(film))).await;
        }
        Ok(page)
    }

    /// Resolve cached ids through the entity path, keeping their order.
    /// `None` when any id no longer exists in the index.
    async fn hydrate(&self, cached: &CursorResult) -> Result<Option<Vec<FilmRecord>>, IndexError> {
        let resolved = try_join_all(cached.ids.iter().map(|id| self.resolve(*id))).await?;
        Ok(resolved.into_iter().collect())
    }
}

fn failed<T>(error: IndexError) -> Lookup<T> {
    if error.is_rejection() {
        Lookup::Rejected(error)
    } else {
        Lookup::BackendUnavailable(error)
    }
}

async fn timed<T>(
    operation: &'static str,
    request: impl Future<Output = Result<T, IndexError>>,
) -> Result<T, IndexError> {
    let started = Instant::now();
    let result = request.await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(error) if error.is_rejection() => "rejected",
        Err(_) => "error",
    };
    histogram!(METRIC_INDEX_REQUEST_MS, "op" => operation, "outcome" => outcome)
        .record(started.elapsed().as_secs_f64() * 1000.0);

    if let Err(error) = &result {
        warn!(
            target = "cinema::catalog",
            source = SOURCE,
            operation,
            error = %error,
            "search index request failed"
        );
    }
    result
}
