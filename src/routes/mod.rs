//! # routes
//!
//! HTTP surface.  [`router`] is shared by `main` and the handler tests.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::require_api_key;
use crate::state::SharedState;

pub mod feed;
pub mod monitor;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Tick feed ─────────────────────────────────────────────────────────
        .route("/api/feed/tick",      post(feed::ingest_tick))
        .route("/api/feed/health",    get(feed::feed_health))
        // ── Monitor ───────────────────────────────────────────────────────────
        .route("/ws/monitor",         get(monitor::ws_monitor))
        .route("/api/monitor/state",  get(monitor::get_state))
        .route("/api/monitor/orders", get(monitor::get_orders))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
