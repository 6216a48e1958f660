//! Draftpool API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use draftpool_api::config::AppConfig;
use draftpool_api::error::AppError;
use draftpool_api::state::AppState;
use draftpool_api::{app, telemetry};
use draftpool_broadcast::LeagueTopics;
use draftpool_core::clock::{Clock, SystemClock};
use draftpool_core::rng::{DeterministicRng, SystemRng};
use draftpool_store::pg_draft_repository::PgDraftRepository;
use draftpool_store::pg_item_catalog::PgItemCatalog;
use draftpool_store::pg_notice_relay::{PgNoticePublisher, PgNoticeRelay};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Pause before re-listening after the notice relay loses its connection.
const RELAY_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Feeds notices committed on any worker into this worker's observers.
async fn relay_notices(pool: PgPool, topics: Arc<LeagueTopics>) {
    loop {
        let outcome = match PgNoticeRelay::listen(&pool).await {
            Ok(relay) => {
                tracing::info!("draft notice relay listening");
                relay.run(topics.as_ref()).await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "draft notice relay stopped, retrying");
        }
        tokio::time::sleep(RELAY_RETRY_DELAY).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let tracer_provider = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Draftpool API server");

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    // Build application state.
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SystemRng::new()));
    let topics = Arc::new(LeagueTopics::new(config.observer_outbox_capacity));
    tokio::spawn(relay_notices(pool.clone(), Arc::clone(&topics)));
    let app_state = AppState::new(
        pool.clone(),
        clock,
        rng,
        Arc::new(PgDraftRepository::new(pool.clone())),
        Arc::new(PgItemCatalog::new(pool.clone())),
        topics,
    )
    .with_notifier(Arc::new(PgNoticePublisher::new(pool)))
    .with_resync_interval(config.resync_interval);

    // TODO: Replace CorsLayer::permissive() with the frontend origin once it is configurable.
    let router = app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let served = axum::serve(listener, router).await;
    telemetry::shutdown(tracer_provider);
    served?;

    Ok(())
}
