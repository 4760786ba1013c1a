//! # error
//!
//! Error types for every layer.
//!
//! * [`AppError`]: HTTP handlers; `IntoResponse` turns it into a JSON body.
//! * [`BrokerError`]: anything a broker adapter can fail with (quote / order).
//! * [`ConfigError`]: fatal startup problems; the tick loop never starts.
//! * [`StrategyError`]: failures while bringing the strategy up.
//!
//! Per-tick failures are never surfaced as errors from the engine: they are
//! folded into the tick report and logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// ─── HTTP ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    /// The request payload was syntactically correct but semantically invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or wrong `X-API-Key`.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The strategy consumer has stopped; ticks can no longer be accepted.
    #[error("Tick feed closed")]
    FeedClosed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_)   => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::FeedClosed      => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// ─── Broker ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Transport failure (connect, timeout, TLS).
    #[error("broker unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The broker answered but reported an error status.
    #[error("broker rejected request: {0}")]
    Api(String),

    /// The broker answered with something we could not interpret.
    #[error("unexpected broker response: {0}")]
    Decode(String),

    /// Quote call succeeded but carried no price for this symbol.
    #[error("no quote for {symbol} on {exchange}")]
    QuoteUnavailable { symbol: String, exchange: String },
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path:   String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("all configuration values are still at their defaults; update at least symbol_initials, gaps and quantities")]
    AllDefaults,
}

// ─── Strategy ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("initial index quote failed: {0}")]
    InitialQuote(#[source] BrokerError),

    #[error("index quote returned an unusable price: {0}")]
    InvalidStartPrice(f64),
}
