//! # events
//!
//! [`WsEvent`]: everything pushed to `/ws/monitor` clients.
//!
//! Events travel over a `tokio::sync::broadcast::Sender<String>` as
//! pre-serialized JSON so subscribers never need to clone the enum.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{OrderDetails, Side};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsEvent {
    /// A side's trigger fired; its reference has already advanced.
    TriggerFired {
        side:          Side,
        price:         f64,
        price_diff:    f64,
        multiplier:    u32,
        new_reference: f64,
    },

    /// Multiplier above `sell_multiplier_threshold`; no order.
    RiskBlocked {
        side:       Side,
        multiplier: u32,
        threshold:  f64,
    },

    /// Strike search gave up (no listed strike, or premium never reached the minimum).
    NoInstrument {
        side:   Side,
        gap:    f64,
        reason: String,
    },

    OrderPlaced {
        order: Box<OrderDetails>,
    },

    OrderFailed {
        side:   Side,
        symbol: String,
        error:  String,
    },

    ReferenceReset {
        side:          Side,
        price:         f64,
        new_reference: f64,
    },

    /// Heartbeat, every 100 ticks.
    TickStats {
        tick_count:    u64,
        trade_count:   u64,
        last_price:    f64,
        pe_reference:  f64,
        ce_reference:  f64,
    },
}

impl WsEvent {
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}

/// Send to every subscriber.  No subscribers is not an error.
pub fn publish(tx: &broadcast::Sender<String>, event: &WsEvent) {
    let _ = tx.send(event.to_json());
}
