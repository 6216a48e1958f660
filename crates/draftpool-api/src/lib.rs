//! Draftpool API: axum routes, WebSocket observers, configuration and
//! telemetry around the draft engine.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router without middleware layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/leagues", routes::draft::router())
        .merge(routes::ws::router())
        .with_state(state)
}
