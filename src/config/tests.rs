use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["cinema-catalog"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "cinema-catalog",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--elastic-url",
        "http://search:9200",
        "--redis-url",
        "redis://cache:6379",
        "--cache-enabled=false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.backends.elastic_url.as_deref(),
                Some("http://search:9200")
            );
            assert_eq!(
                serve.overrides.backends.redis_url.as_deref(),
                Some("redis://cache:6379")
            );
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_check_arguments() {
    let args = CliArgs::parse_from([
        "cinema-catalog",
        "check",
        "--elastic-index",
        "films_v2",
    ]);

    match args.command.expect("check command") {
        Command::Check(check) => {
            assert_eq!(check.backends.elastic_index.as_deref(), Some("films_v2"));
            assert!(check.backends.redis_url.is_none());
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.elastic.url.as_str(), "http://127.0.0.1:9200/");
    assert_eq!(settings.elastic.index, "movies");
    assert_eq!(settings.elastic.timeout, Duration::from_secs(5));
    assert!(settings.redis.url.is_none());
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.key_prefix, "cinema:");
    assert_eq!(settings.cache.film_ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.query_ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.memory_capacity.get(), 10_000);
}

#[test]
fn cache_ttls_can_be_overridden_via_cli() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        cache_film_ttl_seconds: Some(60),
        cache_query_ttl_seconds: Some(15),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.film_ttl, Duration::from_secs(60));
    assert_eq!(settings.cache.query_ttl, Duration::from_secs(15));
}

#[test]
fn blank_redis_url_means_in_process_store() {
    let mut raw = RawSettings::default();
    raw.redis.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.redis.url.is_none());
}

#[test]
fn invalid_values_name_their_key() {
    let cases: Vec<(RawSettings, &str)> = vec![
        (
            RawSettings {
                cache: RawCacheSettings {
                    query_ttl_seconds: Some(0),
                    ..Default::default()
                },
                ..Default::default()
            },
            "cache.query_ttl_seconds",
        ),
        (
            RawSettings {
                cache: RawCacheSettings {
                    film_ttl_seconds: Some(u64::MAX),
                    ..Default::default()
                },
                ..Default::default()
            },
            "cache.film_ttl_seconds",
        ),
        (
            RawSettings {
                elastic: RawElasticSettings {
                    url: Some("ftp://search".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
            "elastic.url",
        ),
        (
            RawSettings {
                redis: RawRedisSettings {
                    url: Some("http://cache:6379".to_string()),
                },
                ..Default::default()
            },
            "redis.url",
        ),
        (
            RawSettings {
                logging: RawLoggingSettings {
                    level: Some("loud".to_string()),
                    json: None,
                },
                ..Default::default()
            },
            "logging.level",
        ),
    ];

    for (raw, expected) in cases {
        match Settings::from_raw(raw) {
            Err(LoadError::Invalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected invalid `{expected}`, got {other:?}"),
        }
    }
}

#[test]
fn ttl_may_reach_but_not_pass_the_maximum() {
    let mut raw = RawSettings::default();
    raw.cache.query_ttl_seconds = Some(MAX_TTL_SECS);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.query_ttl, Duration::from_secs(MAX_TTL_SECS));

    let mut raw = RawSettings::default();
    raw.cache.query_ttl_seconds = Some(MAX_TTL_SECS + 1);
    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, reason }) => {
            assert_eq!(key, "cache.query_ttl_seconds");
            assert!(reason.contains("must not exceed"), "{reason}");
        }
        other => panic!("expected invalid ttl, got {other:?}"),
    }
}

#[test]
fn cache_config_follows_settings() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    let config = crate::cache::CacheConfig::from(&settings.cache);
    assert_eq!(config.film_ttl(), settings.cache.film_ttl);
    assert_eq!(config.key_prefix, settings.cache.key_prefix);
}
