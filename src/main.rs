use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use cinema_catalog::{
    application::error::AppError,
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        lifecycle::Backends,
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Check(_) => run_check(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let backends = Backends::start(&settings).await?;
    let state = HttpState {
        catalog: backends.catalog(),
        index: backends.index(),
    };

    let result = serve_http(&settings, state).await;
    backends.stop().await;
    result
}

async fn run_check(settings: config::Settings) -> Result<(), AppError> {
    let backends = Backends::start(&settings).await?;
    info!(
        elastic = %settings.elastic.url,
        index = %settings.elastic.index,
        cache = backends.store().is_some(),
        "backends reachable"
    );
    backends.stop().await;
    Ok(())
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let draining = Arc::new(Notify::new());
    let trigger = draining.clone();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            info!("shutdown requested; draining in-flight requests");
            trigger.notify_one();
        },
    );

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        () = drain_deadline(draining, grace) => {
            warn!(grace_seconds = grace.as_secs(), "graceful shutdown timed out");
            Ok(())
        }
    }
}

async fn drain_deadline(draining: Arc<Notify>, grace: Duration) {
    draining.notified().await;
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
