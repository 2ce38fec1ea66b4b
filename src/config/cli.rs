use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the catalog binary.
#[derive(Debug, Parser)]
#[command(name = "cinema-catalog", version, about = "Film catalog query service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CINEMA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Connect to the search index and cache store, then exit.
    Check(CheckArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub backends: BackendOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BackendOverrides {
    /// Override the Elasticsearch base URL.
    #[arg(long = "elastic-url", value_name = "URL")]
    pub elastic_url: Option<String>,

    /// Override the name of the film index.
    #[arg(long = "elastic-index", value_name = "NAME")]
    pub elastic_index: Option<String>,

    /// Override the Redis connection URL.
    #[arg(long = "redis-url", value_name = "URL")]
    pub redis_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub backends: BackendOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the entity and query-result caches.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the TTL of cached films.
    #[arg(long = "cache-film-ttl-seconds", value_name = "SECONDS")]
    pub cache_film_ttl_seconds: Option<u64>,

    /// Override the TTL of cached query results.
    #[arg(long = "cache-query-ttl-seconds", value_name = "SECONDS")]
    pub cache_query_ttl_seconds: Option<u64>,
}
