//! # auth: API key middleware
//!
//! * `API_KEY` unset or empty → every request passes (dev mode).
//! * `API_KEY` set → every request must carry `X-API-Key: <key>`.
//!
//! `/api/feed/health` is always open so load balancers can probe it.
//!
//! ```bash
//! curl -H "X-API-Key: $API_KEY" http://localhost:3000/api/monitor/state
//! ```

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::AppError;
use crate::state::SharedState;

pub const API_KEY_HEADER: &str = "X-API-Key";
const OPEN_PATHS: [&str; 1] = ["/api/feed/health"];

pub async fn require_api_key(
    State(state): State<SharedState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let path = request.uri().path();
    if OPEN_PATHS.contains(&path) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided == expected {
        next.run(request).await
    } else {
        warn!(path, "❌ Unauthorized request, invalid or missing X-API-Key");
        AppError::Unauthorized("invalid or missing X-API-Key header".into()).into_response()
    }
}
