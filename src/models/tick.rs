//! # models::tick
//!
//! Defines [`TickData`], the index price update pushed to
//! `POST /api/feed/tick` by whatever process holds the market-data socket.
//!
//! Only `last_price` drives the strategy; the other fields are carried for
//! logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single index price update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickData {
    /// Exchange token of the index, as sent by the feed (optional).
    #[serde(default)]
    pub instrument_token: Option<u64>,

    /// Last traded price of the underlying index.
    pub last_price: f64,

    /// Exchange timestamp, when the feed provides one.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TickData {
    #[cfg(test)]
    pub fn new(last_price: f64) -> Self {
        Self {
            instrument_token: None,
            last_price,
            timestamp: None,
        }
    }

    /// A price the engine can act on: finite and strictly positive.
    #[inline]
    pub fn is_tradeable(&self) -> bool {
        self.last_price.is_finite() && self.last_price > 0.0
    }
}

/// Body of the ingestion endpoint: one tick, or a batch in arrival order.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TickPayload {
    One(TickData),
    Many(Vec<TickData>),
}

impl TickPayload {
    pub fn into_ticks(self) -> Vec<TickData> {
        match self {
            TickPayload::One(tick) => vec![tick],
            TickPayload::Many(ticks) => ticks,
        }
    }
}
