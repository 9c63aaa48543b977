use std::{process, sync::Arc, time::Duration};

use tablero::{
    application::{
        error::AppError,
        pagination::PageSizeBounds,
        repos::ResourceRepository,
        resources::ResourceService,
    },
    cache::{CacheConfig, CacheStore, MemoryStore, driver_supports_tags},
    config,
    infra::{
        catalog::InMemoryCatalog,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::CheckConfig => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repo: Arc<dyn ResourceRepository> = match settings.catalog.seed_file.as_deref() {
        Some(path) => Arc::new(InMemoryCatalog::load(path).await?),
        None => {
            warn!("no catalog.seed_file configured; starting with an empty catalog");
            Arc::new(InMemoryCatalog::new())
        }
    };

    let cache_config = CacheConfig::from(&settings.cache);
    if !matches!(cache_config.driver.as_str(), "memory" | "array") {
        info!(
            driver = %cache_config.driver,
            tags = driver_supports_tags(&cache_config.driver),
            "no built-in backend for cache driver; entries are kept in process memory"
        );
    }
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::from_config(&cache_config));

    let resources = ResourceService::new(
        repo,
        store,
        cache_config,
        PageSizeBounds::from(&settings.pagination),
    );

    serve_http(&settings, ApiState::new(resources)).await
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

/// Resolves on Ctrl-C. In-flight requests then get `grace` to finish before
/// the process exits regardless.
async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(grace_seconds = grace.as_secs(), "shutdown requested; draining connections");

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!("graceful shutdown timed out; exiting");
        process::exit(0);
    });
}
