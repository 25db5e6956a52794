use std::{process, sync::Arc, time::Duration};

use feedfront::{
    application::{
        error::AppError,
        feed::FeedService,
        fetcher::ResourceFetcher,
        invalidation::InvalidationService,
        webhook::WebhookVerifier,
    },
    cache::{CacheConfig, GenerationStore, ResponseCache},
    config,
    infra::{
        cache_sweeper,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        upstream::HttpFeedFetcher,
    },
};
use tokio::signal;
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
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Check(_) => run_check(&settings),
    }
}

fn run_check(settings: &config::Settings) -> Result<(), AppError> {
    build_fetcher(settings)?;

    info!(
        target = "feedfront::check",
        addr = %settings.server.addr,
        upstream = settings.upstream.base_url.as_ref().map(|url| url.as_str()).unwrap_or(""),
        cache_ttl_seconds = settings.cache.ttl.as_secs(),
        cache_max_entries = settings.cache.max_entries.get(),
        default_limit = settings.pagination.default_limit.get(),
        max_limit = settings.pagination.max_limit.get(),
        webhook_secret = settings.webhook.secret.is_some(),
        "configuration is valid"
    );
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let fetcher = build_fetcher(&settings)?;
    let cache_config = CacheConfig::from(&settings.cache);
    let cache = Arc::new(ResponseCache::new(&cache_config));
    let sweep_interval = cache_config.sweep_interval();

    let feeds = Arc::new(FeedService::new(
        fetcher,
        Arc::new(GenerationStore::new()),
        Arc::clone(&cache),
        cache_config,
    ));
    let verifier = WebhookVerifier::new(settings.webhook.secret.as_deref());
    if !verifier.is_enforced() {
        warn!(
            target = "feedfront::serve",
            "webhook secret not configured; any sender may invalidate"
        );
    }
    let invalidation = Arc::new(InvalidationService::new(Arc::clone(&feeds), verifier));

    let state = HttpState {
        feeds,
        invalidation,
        pagination: settings.pagination,
    };

    let sweeper = cache_sweeper::spawn(cache, sweep_interval);
    let result = serve_http(&settings, state).await;

    sweeper.abort();
    let _ = sweeper.await;

    result
}

fn build_fetcher(settings: &config::Settings) -> Result<Arc<dyn ResourceFetcher>, AppError> {
    let base_url = settings
        .upstream
        .base_url
        .clone()
        .ok_or_else(|| InfraError::configuration("upstream base url is not configured"))?;

    let fetcher = HttpFeedFetcher::new(
        base_url,
        settings.upstream.timeout,
        &settings.upstream.user_agent,
    )?;
    Ok(Arc::new(fetcher))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "feedfront::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, then arms a hard deadline for in-flight
/// requests to drain.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(
        target = "feedfront::serve",
        grace_seconds = grace.as_secs(),
        "shutdown requested, draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "feedfront::serve", "graceful shutdown timed out");
        process::exit(1);
    });
}
