//! Typed, failure-absorbing access to a [`CacheStore`].
//!
//! Store errors and undecodable payloads are logged and counted here and
//! never reach the caller: both read as a miss, and a failed write is dropped.

use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::codec;
use super::store::CacheStore;
use super::{
    METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_MALFORMED_TOTAL, METRIC_CACHE_MISS_TOTAL,
    METRIC_CACHE_STORE_ERROR_TOTAL,
};

pub(crate) async fn read<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &str,
    cache: &'static str,
) -> Option<T> {
    let bytes = match store.get(key).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            counter!(METRIC_CACHE_MISS_TOTAL, "cache" => cache).increment(1);
            return None;
        }
        Err(error) => {
            warn!(
                target = "cinema::cache",
                cache,
                key,
                error = %error,
                "cache read failed; treating as miss"
            );
            counter!(METRIC_CACHE_STORE_ERROR_TOTAL, "cache" => cache, "op" => "get").increment(1);
            counter!(METRIC_CACHE_MISS_TOTAL, "cache" => cache).increment(1);
            return None;
        }
    };

    match codec::decode(&bytes) {
        Ok(value) => {
            counter!(METRIC_CACHE_HIT_TOTAL, "cache" => cache).increment(1);
            debug!(target = "cinema::cache", cache, key, "cache hit");
            Some(value)
        }
        Err(error) => {
            warn!(
                target = "cinema::cache",
                cache,
                key,
                error = %error,
                "discarding malformed cache payload"
            );
            counter!(METRIC_CACHE_MALFORMED_TOTAL, "cache" => cache).increment(1);
            counter!(METRIC_CACHE_MISS_TOTAL, "cache" => cache).increment(1);
            None
        }
    }
}

pub(crate) async fn write<T: Serialize>(
    store: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
    cache: &'static str,
) {
    let bytes = match codec::encode(value) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(
                target = "cinema::cache",
                cache,
                key,
                error = %error,
                "skipping cache write"
            );
            return;
        }
    };

    if let Err(error) = store.set(key, bytes, ttl).await {
        warn!(
            target = "cinema::cache",
            cache,
            key,
            error = %error,
            "cache write failed"
        );
        counter!(METRIC_CACHE_STORE_ERROR_TOTAL, "cache" => cache, "op" => "set").increment(1);
    }
}
