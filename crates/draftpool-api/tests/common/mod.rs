//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use draftpool_broadcast::LeagueTopics;
use draftpool_core::clock::Clock;
use draftpool_core::rng::DeterministicRng;
use draftpool_store::pg_draft_repository::PgDraftRepository;
use draftpool_store::pg_item_catalog::PgItemCatalog;
use draftpool_store::pg_notice_relay::{PgNoticePublisher, PgNoticeRelay};
use draftpool_test_support::{FixedClock, LeagueFixture, SequenceRng};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use draftpool_api::auth::CALLER_HEADER;
use draftpool_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router with the PostgreSQL store and deterministic
/// Clock/RNG.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_rng(pool, SequenceRng::new(vec![]))
}

/// Build the full app router with a custom `SequenceRng` for tests that
/// start drafts and need a known draft order.
pub fn build_test_app_with_rng(pool: PgPool, rng: SequenceRng) -> Router {
    build_test_app_with_topics(pool, rng, Arc::new(LeagueTopics::new(8)))
}

/// Like `build_test_app_with_rng`, sharing the given observer hub.
pub fn build_test_app_with_topics(
    pool: PgPool,
    rng: SequenceRng,
    topics: Arc<LeagueTopics>,
) -> Router {
    let clock = fixed_clock();
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let app_state = AppState::new(
        pool.clone(),
        clock,
        rng,
        Arc::new(PgDraftRepository::new(pool.clone())),
        Arc::new(PgItemCatalog::new(pool)),
        topics,
    );
    draftpool_api::app(app_state)
}

/// One worker of a multi-worker deployment: its notices go through
/// PostgreSQL, and a relay feeds notices from every worker into `topics`.
pub async fn build_worker(pool: PgPool, rng: SequenceRng, topics: Arc<LeagueTopics>) -> Router {
    let relay = PgNoticeRelay::listen(&pool).await.unwrap();
    let relay_topics = Arc::clone(&topics);
    tokio::spawn(async move {
        let _ = relay.run(relay_topics.as_ref()).await;
    });

    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let app_state = AppState::new(
        pool.clone(),
        fixed_clock(),
        rng,
        Arc::new(PgDraftRepository::new(pool.clone())),
        Arc::new(PgItemCatalog::new(pool.clone())),
        topics,
    )
    .with_notifier(Arc::new(PgNoticePublisher::new(pool)));
    draftpool_api::app(app_state)
}

/// Draws that keep join order as draft order for `participants` players.
pub fn join_order_rng(participants: u32) -> SequenceRng {
    SequenceRng::new((1..participants).rev().collect())
}

/// Insert schools 1..=40, the fixture's league and its participants.
pub async fn seed_league(pool: &PgPool, fixture: &LeagueFixture) {
    for id in 1..=40 {
        sqlx::query("INSERT INTO schools (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(id)
            .bind(format!("School {id}"))
            .execute(pool)
            .await
            .unwrap();
    }

    let league = &fixture.league;
    sqlx::query(
        "INSERT INTO leagues (id, name, season, max_picks_per_participant, status, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(league.id)
    .bind(&league.name)
    .bind(league.season)
    .bind(league.max_picks_per_participant)
    .bind(league.status.as_str())
    .bind(league.created_by)
    .execute(pool)
    .await
    .unwrap();

    for p in &fixture.participants {
        sqlx::query(
            "INSERT INTO league_participants (league_id, user_id, team_name, joined_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(league.id)
        .bind(p.user_id)
        .bind(&p.team_name)
        .bind(p.joined_at)
        .execute(pool)
        .await
        .unwrap();
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request as `caller` with an optional JSON body.
pub async fn post_as(
    app: Router,
    uri: &str,
    caller: Uuid,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CALLER_HEADER, caller.to_string());
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

/// Send a GET request as `caller`.
pub async fn get_as(app: Router, uri: &str, caller: Uuid) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(CALLER_HEADER, caller.to_string())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
