use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::catalog::METRIC_INDEX_REQUEST_MS;
use crate::cache::{
    METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_MALFORMED_TOTAL, METRIC_CACHE_MISS_TOTAL,
    METRIC_CACHE_QUERY_STALE_TOTAL, METRIC_CACHE_STORE_ERROR_TOTAL,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT_TOTAL,
            Unit::Count,
            "Total number of catalog cache hits, labelled by cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS_TOTAL,
            Unit::Count,
            "Total number of catalog cache misses, labelled by cache."
        );
        describe_counter!(
            METRIC_CACHE_MALFORMED_TOTAL,
            Unit::Count,
            "Total number of cached payloads discarded as undecodable."
        );
        describe_counter!(
            METRIC_CACHE_STORE_ERROR_TOTAL,
            Unit::Count,
            "Total number of failed cache store operations, labelled by op."
        );
        describe_counter!(
            METRIC_CACHE_QUERY_STALE_TOTAL,
            Unit::Count,
            "Total number of cached pages refreshed because a film left the index."
        );
        describe_histogram!(
            METRIC_INDEX_REQUEST_MS,
            Unit::Milliseconds,
            "Search index request latency in milliseconds."
        );
    });
}
