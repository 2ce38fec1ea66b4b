mod support;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cinema_catalog::application::catalog::{CatalogService, METRIC_INDEX_REQUEST_MS};
use cinema_catalog::application::pagination::CursorResult;
use cinema_catalog::application::query::FilmListRequest;
use cinema_catalog::cache::{
    CacheConfig, CacheKeys, CacheStore, CatalogCache, METRIC_CACHE_HIT_TOTAL,
    METRIC_CACHE_MALFORMED_TOTAL, METRIC_CACHE_MISS_TOTAL, METRIC_CACHE_QUERY_STALE_TOTAL,
    METRIC_CACHE_STORE_ERROR_TOTAL, encode,
};
use metrics_util::debugging::DebuggingRecorder;
use uuid::Uuid;

use support::{CountingIndex, FailingStore, Harness, catalog_films, params};

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Film miss then hit.
    let films = catalog_films();
    let target = films[0].id;
    let harness = Harness::new(films);
    assert!(harness.service.film(target).await.is_found());
    assert!(harness.service.film(target).await.is_found());

    // Malformed query entry.
    let garbage = params(FilmListRequest {
        sort: Some("title".to_string()),
        ..Default::default()
    });
    let keys = CacheKeys::new(harness.config.key_prefix.clone());
    harness
        .store
        .set(
            &keys.compose(&garbage),
            Bytes::from_static(b"{broken"),
            Duration::from_secs(60),
        )
        .await
        .expect("seed garbage");
    assert!(harness.service.films(&garbage).await.is_found());

    // Query entry pointing at a film the index no longer has.
    let stale = params(FilmListRequest {
        sort: Some("-imdb_rating".to_string()),
        ..Default::default()
    });
    let dangling = CursorResult {
        ids: vec![Uuid::new_v4()],
        next_cursor: None,
    };
    harness
        .store
        .set(
            &keys.compose(&stale),
            encode(&dangling).expect("encode"),
            Duration::from_secs(60),
        )
        .await
        .expect("seed stale");
    assert!(harness.service.films(&stale).await.is_found());

    // Store that refuses every operation.
    let broken = CatalogService::new(
        Arc::new(CountingIndex::with_films(catalog_films())),
        Some(CatalogCache::new(
            Arc::new(FailingStore::default()),
            &CacheConfig::default(),
        )),
    );
    assert!(broken.films(&garbage).await.is_found());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        METRIC_CACHE_HIT_TOTAL,
        METRIC_CACHE_MISS_TOTAL,
        METRIC_CACHE_MALFORMED_TOTAL,
        METRIC_CACHE_STORE_ERROR_TOTAL,
        METRIC_CACHE_QUERY_STALE_TOTAL,
        METRIC_INDEX_REQUEST_MS,
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
