//! # routes::feed
//!
//! Tick ingestion.  Whatever process holds the market-data socket pushes
//! index prices here; the handler only enqueues, the tick runner does the work.
//!
//! | Method | Path               | Description                               |
//! |--------|--------------------|-------------------------------------------|
//! | POST   | `/api/feed/tick`   | One tick or an array of ticks, in order   |
//! | GET    | `/api/feed/health` | Counters and queue headroom (no auth)     |

use std::sync::atomic::Ordering;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{debug, error};

use crate::{
    error::AppError,
    models::TickPayload,
    state::SharedState,
};

// ─── POST /api/feed/tick ──────────────────────────────────────────────────────

/// ```json
/// { "last_price": 24512.5, "instrument_token": 256265 }
/// ```
/// or an array of the same.  A full queue makes this handler wait, so ticks
/// are never dropped or reordered.
pub async fn ingest_tick(
    State(state): State<SharedState>,
    Json(payload): Json<TickPayload>,
) -> Result<impl IntoResponse, AppError> {
    let ticks = payload.into_ticks();

    if ticks.is_empty() {
        return Err(AppError::BadRequest("empty tick batch".into()));
    }
    if let Some(bad) = ticks.iter().find(|t| !t.is_tradeable()) {
        return Err(AppError::BadRequest(format!(
            "last_price must be a positive number (got {})",
            bad.last_price
        )));
    }

    let queued = ticks.len();
    for tick in ticks {
        state.tick_tx.send(tick).await.map_err(|_| {
            error!("Tick runner is gone, rejecting ticks");
            AppError::FeedClosed
        })?;
    }
    debug!(queued, "ticks enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "ok":     true,
            "queued": queued,
        })),
    ))
}

// ─── GET /api/feed/health ─────────────────────────────────────────────────────

pub async fn feed_health(State(state): State<SharedState>) -> impl IntoResponse {
    let runner_alive = !state.tick_tx.is_closed();

    Json(json!({
        "ok":             runner_alive,
        "status":         if runner_alive { "running" } else { "stopped" },
        "tick_count":     state.tick_count.load(Ordering::Relaxed),
        "trade_count":    state.trade_count.load(Ordering::Relaxed),
        "queue_capacity": state.queue_capacity,
        "queue_free":     state.tick_tx.capacity(),
    }))
}
