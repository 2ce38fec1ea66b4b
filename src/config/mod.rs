//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::MAX_TTL_SECS;

mod cli;

pub use cli::{BackendOverrides, CheckArgs, CliArgs, Command, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "cinema";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_ELASTIC_URL: &str = "http://127.0.0.1:9200";
const DEFAULT_ELASTIC_INDEX: &str = "movies";
const DEFAULT_ELASTIC_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ELASTIC_STARTUP_RETRIES: u64 = 10;
const DEFAULT_ELASTIC_STARTUP_RETRY_DELAY_MS: u64 = 1_000;
const DEFAULT_CACHE_KEY_PREFIX: &str = "cinema:";
const DEFAULT_CACHE_FILM_TTL_SECS: u64 = 60 * 5;
const DEFAULT_CACHE_QUERY_TTL_SECS: u64 = 60 * 5;
const DEFAULT_CACHE_MEMORY_CAPACITY: usize = 10_000;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub elastic: ElasticSettings,
    pub redis: RedisSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ElasticSettings {
    pub url: Url,
    pub index: String,
    pub timeout: Duration,
    /// Pings attempted before startup gives up on the index.
    pub startup_retries: NonZeroU32,
    pub startup_retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// Shared store location; the in-process store is used when absent.
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub key_prefix: String,
    pub film_ttl: Duration,
    pub query_ttl: Duration,
    pub memory_capacity: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("CINEMA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Check(args)) => raw.apply_backend_overrides(&args.backends),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    elastic: RawElasticSettings,
    redis: RawRedisSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(seconds) = overrides.cache_film_ttl_seconds {
            self.cache.film_ttl_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_query_ttl_seconds {
            self.cache.query_ttl_seconds = Some(seconds);
        }

        self.apply_backend_overrides(&overrides.backends);
    }

    fn apply_backend_overrides(&mut self, overrides: &BackendOverrides) {
        if let Some(url) = overrides.elastic_url.as_ref() {
            self.elastic.url = Some(url.clone());
        }
        if let Some(index) = overrides.elastic_index.as_ref() {
            self.elastic.index = Some(index.clone());
        }
        if let Some(url) = overrides.redis_url.as_ref() {
            self.redis.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            elastic,
            redis,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            elastic: build_elastic_settings(elastic)?,
            redis: build_redis_settings(redis)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_elastic_settings(elastic: RawElasticSettings) -> Result<ElasticSettings, LoadError> {
    let raw_url = non_empty(elastic.url).unwrap_or_else(|| DEFAULT_ELASTIC_URL.to_string());
    let url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("elastic.url", format!("failed to parse: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "elastic.url",
            "scheme must be http or https",
        ));
    }

    let index = non_empty(elastic.index).unwrap_or_else(|| DEFAULT_ELASTIC_INDEX.to_string());
    if index.contains('/') {
        return Err(LoadError::invalid(
            "elastic.index",
            "index name must not contain `/`",
        ));
    }

    let timeout_ms = elastic.timeout_ms.unwrap_or(DEFAULT_ELASTIC_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "elastic.timeout_ms",
            "must be greater than zero",
        ));
    }

    let startup_retries = non_zero_u32(
        elastic
            .startup_retries
            .unwrap_or(DEFAULT_ELASTIC_STARTUP_RETRIES),
        "elastic.startup_retries",
    )?;

    let retry_delay_ms = elastic
        .startup_retry_delay_ms
        .unwrap_or(DEFAULT_ELASTIC_STARTUP_RETRY_DELAY_MS);

    Ok(ElasticSettings {
        url,
        index,
        timeout: Duration::from_millis(timeout_ms),
        startup_retries,
        startup_retry_delay: Duration::from_millis(retry_delay_ms),
    })
}

fn build_redis_settings(redis: RawRedisSettings) -> Result<RedisSettings, LoadError> {
    let url = non_empty(redis.url);
    if let Some(candidate) = url.as_deref() {
        let parsed = Url::parse(candidate)
            .map_err(|err| LoadError::invalid("redis.url", format!("failed to parse: {err}")))?;
        if !matches!(parsed.scheme(), "redis" | "rediss") {
            return Err(LoadError::invalid(
                "redis.url",
                "scheme must be redis or rediss",
            ));
        }
    }
    Ok(RedisSettings { url })
}

fn ttl_seconds(key: &'static str, seconds: u64) -> Result<u64, LoadError> {
    if seconds == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    if seconds > MAX_TTL_SECS {
        return Err(LoadError::invalid(
            key,
            format!("must not exceed {MAX_TTL_SECS} seconds (30 days)"),
        ));
    }
    Ok(seconds)
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let film_ttl_secs = ttl_seconds(
        "cache.film_ttl_seconds",
        cache.film_ttl_seconds.unwrap_or(DEFAULT_CACHE_FILM_TTL_SECS),
    )?;
    let query_ttl_secs = ttl_seconds(
        "cache.query_ttl_seconds",
        cache.query_ttl_seconds.unwrap_or(DEFAULT_CACHE_QUERY_TTL_SECS),
    )?;

    let memory_capacity = NonZeroUsize::new(
        cache
            .memory_capacity
            .unwrap_or(DEFAULT_CACHE_MEMORY_CAPACITY),
    )
    .ok_or_else(|| LoadError::invalid("cache.memory_capacity", "must be greater than zero"))?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        key_prefix: cache
            .key_prefix
            .unwrap_or_else(|| DEFAULT_CACHE_KEY_PREFIX.to_string()),
        film_ttl: Duration::from_secs(film_ttl_secs),
        query_ttl: Duration::from_secs(query_ttl_secs),
        memory_capacity,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawElasticSettings {
    url: Option<String>,
    index: Option<String>,
    timeout_ms: Option<u64>,
    startup_retries: Option<u64>,
    startup_retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRedisSettings {
    url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    key_prefix: Option<String>,
    film_ttl_seconds: Option<u64>,
    query_ttl_seconds: Option<u64>,
    memory_capacity: Option<usize>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
