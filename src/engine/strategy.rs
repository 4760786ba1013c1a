//! # engine::strategy
//!
//! [`SurvivorStrategy`]: owns both side trackers and runs the per-tick
//! pipeline:
//!
//! ```text
//! price ─▶ trigger(PE) ─▶ [risk ─▶ strike search ─▶ execute] ─┐
//!       ─▶ trigger(CE) ─▶ [risk ─▶ strike search ─▶ execute] ─┤
//!       ─▶ reset(PE), reset(CE) ◀──────────────────────────────┘
//! ```
//!
//! Both sides see the same price.  `on_tick` never fails: every per-side
//! problem ends up in the returned [`TickReport`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::broker::{Broker, OrderRecorder};
use crate::config::StrategyConfig;
use crate::engine::executor;
use crate::engine::reset::reset;
use crate::engine::risk_gate::{RiskDecision, RiskGate};
use crate::engine::strike_search::{self, StrikeOutcome};
use crate::engine::trigger;
use crate::error::StrategyError;
use crate::events::{publish, WsEvent};
use crate::models::{OrderDetails, Side, SideState};

// ─── Reports ──────────────────────────────────────────────────────────────────

/// What happened to one side on one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SideOutcome {
    /// No trigger.
    Idle,
    RiskBlocked { multiplier: u32, reason: String },
    NoInstrument { gap: f64 },
    SearchExhausted { gap: f64, attempts: u32 },
    QuoteFailed { error: String },
    OrderFailed { symbol: String, error: String },
    Traded { order: OrderDetails, multiplier: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub price:   f64,
    /// Price was not finite or not positive; nothing was evaluated.
    pub skipped: bool,
    pub pe:      SideOutcome,
    pub ce:      SideOutcome,
    /// `(side, new_reference)` for every reset applied this tick.
    pub resets:  Vec<(Side, f64)>,
}

impl TickReport {
    fn skipped(price: f64) -> Self {
        Self { price, skipped: true, pe: SideOutcome::Idle, ce: SideOutcome::Idle, resets: Vec::new() }
    }

    pub fn trades(&self) -> u64 {
        [&self.pe, &self.ce]
            .into_iter()
            .filter(|o| matches!(o, SideOutcome::Traded { .. }))
            .count() as u64
    }
}

/// Read-only view published for the monitor after every tick.
#[derive(Debug, Clone, Serialize)]
pub struct StrategySnapshot {
    pub pe:         SideState,
    pub ce:         SideState,
    pub last_price: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

// ─── Strategy ─────────────────────────────────────────────────────────────────

pub struct SurvivorStrategy {
    config:     Arc<StrategyConfig>,
    pe:         SideState,
    ce:         SideState,
    risk:       RiskGate,
    broker:     Arc<dyn Broker>,
    recorder:   Arc<dyn OrderRecorder>,
    events:     broadcast::Sender<String>,
    last_price: Option<f64>,
}

impl SurvivorStrategy {
    /// Seed both references.  A start point of 0 means "use the live index
    /// price", which costs one quote; failing that quote is fatal.
    pub async fn initialize(
        config: Arc<StrategyConfig>,
        broker: Arc<dyn Broker>,
        recorder: Arc<dyn OrderRecorder>,
        events: broadcast::Sender<String>,
    ) -> Result<Self, StrategyError> {
        let start_points = Side::BOTH.map(|side| config.side(side).start_point);
        let needs_live = start_points.contains(&0.0);

        let live = if needs_live {
            let quote = broker
                .get_quote(&config.index_symbol, &config.index_exchange)
                .await
                .map_err(StrategyError::InitialQuote)?;
            if !(quote.last_price.is_finite() && quote.last_price > 0.0) {
                return Err(StrategyError::InvalidStartPrice(quote.last_price));
            }
            info!(index = %config.index_symbol, price = quote.last_price, "📈 Live index price fetched");
            quote.last_price
        } else {
            0.0
        };

        let start = |point: f64| if point == 0.0 { live } else { point };
        let [pe, ce] = start_points.map(|point| SideState::new(start(point)));

        info!(
            pe_reference = pe.reference_price,
            ce_reference = ce.reference_price,
            broker = broker.name(),
            "🎯 Survivor strategy initialized"
        );

        Ok(Self {
            risk: RiskGate::new(config.sell_multiplier_threshold),
            config,
            pe,
            ce,
            broker,
            recorder,
            events,
            last_price: None,
        })
    }

    pub fn state(&self, side: Side) -> SideState {
        match side {
            Side::Pe => self.pe,
            Side::Ce => self.ce,
        }
    }

    fn state_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Pe => &mut self.pe,
            Side::Ce => &mut self.ce,
        }
    }

    pub fn snapshot(&self) -> StrategySnapshot {
        StrategySnapshot {
            pe:         self.pe,
            ce:         self.ce,
            last_price: self.last_price,
            updated_at: Utc::now(),
        }
    }

    // ─── Tick ────────────────────────────────────────────────────────────────

    pub async fn on_tick(&mut self, price: f64) -> TickReport {
        if !(price.is_finite() && price > 0.0) {
            warn!(price, "⚠️ Unusable tick price, skipped");
            return TickReport::skipped(price);
        }
        self.last_price = Some(price);
        self.broker.observe_price(price);

        // ── 1. Triggers, PE then CE ──────────────────────────────────────────
        let pe = self.process_side(Side::Pe, price).await;
        let ce = self.process_side(Side::Ce, price).await;

        // ── 2. Resets ────────────────────────────────────────────────────────
        let mut resets = Vec::new();
        for side in Side::BOTH {
            let reset_gap = self.config.side(side).reset_gap;
            if let Some(new_reference) = reset(side, price, self.state_mut(side), reset_gap) {
                info!(%side, price, new_reference, "🔄 Reference reset");
                publish(&self.events, &WsEvent::ReferenceReset { side, price, new_reference });
                resets.push((side, new_reference));
            }
        }

        if pe == SideOutcome::Idle && ce == SideOutcome::Idle && resets.is_empty() {
            debug!(
                price,
                pe_reference = self.pe.reference_price,
                ce_reference = self.ce.reference_price,
                "market under control"
            );
        }

        TickReport { price, skipped: false, pe, ce, resets }
    }

    async fn process_side(&mut self, side: Side, price: f64) -> SideOutcome {
        let params = self.config.side(side);

        // ── Trigger (advances the reference when it fires) ───────────────────
        let decision = trigger::evaluate(side, price, self.state_mut(side), params.gap);
        if !decision.fired {
            return SideOutcome::Idle;
        }
        let new_reference = self.state(side).reference_price;

        info!(
            %side,
            price,
            price_diff = decision.price_diff,
            multiplier = decision.multiplier,
            new_reference,
            "⚡ Trigger fired"
        );
        publish(&self.events, &WsEvent::TriggerFired {
            side,
            price,
            price_diff: decision.price_diff,
            multiplier: decision.multiplier,
            new_reference,
        });

        // ── Risk ─────────────────────────────────────────────────────────────
        if let RiskDecision::Blocked(reason) = self.risk.check(side, decision.multiplier) {
            publish(&self.events, &WsEvent::RiskBlocked {
                side,
                multiplier: decision.multiplier,
                threshold:  self.risk.threshold(),
            });
            return SideOutcome::RiskBlocked { multiplier: decision.multiplier, reason };
        }

        // ── Strike search ────────────────────────────────────────────────────
        let search = strike_search::find(
            side,
            &self.config.symbol_initials,
            price,
            params.symbol_gap,
            &self.config,
            self.broker.as_ref(),
        )
        .await;

        let (instrument, premium) = match search {
            Ok(StrikeOutcome::Found { instrument, premium, .. }) => (instrument, premium),
            Ok(StrikeOutcome::NoInstrument { gap }) => {
                self.publish_no_instrument(side, gap, "no listed strike near target".into());
                return SideOutcome::NoInstrument { gap };
            }
            Ok(StrikeOutcome::Exhausted { gap, attempts }) => {
                self.publish_no_instrument(side, gap, format!("premium below minimum after {attempts} candidates"));
                return SideOutcome::SearchExhausted { gap, attempts };
            }
            Err(e) => {
                self.publish_no_instrument(side, params.symbol_gap, format!("quote failed: {e}"));
                return SideOutcome::QuoteFailed { error: e.to_string() };
            }
        };

        // ── Execute ──────────────────────────────────────────────────────────
        let quantity = params.quantity.saturating_mul(decision.multiplier);
        let result = executor::execute(
            &instrument,
            quantity,
            side,
            premium,
            &self.config,
            self.broker.as_ref(),
            self.recorder.as_ref(),
        )
        .await;

        match result {
            Ok(order) => {
                self.state_mut(side).armed = true;
                publish(&self.events, &WsEvent::OrderPlaced { order: Box::new(order.clone()) });
                SideOutcome::Traded { order, multiplier: decision.multiplier }
            }
            Err(e) => {
                publish(&self.events, &WsEvent::OrderFailed {
                    side,
                    symbol: instrument.trading_symbol.clone(),
                    error:  e.to_string(),
                });
                SideOutcome::OrderFailed { symbol: instrument.trading_symbol, error: e.to_string() }
            }
        }
    }

    fn publish_no_instrument(&self, side: Side, gap: f64, reason: String) {
        publish(&self.events, &WsEvent::NoInstrument { side, gap, reason });
    }
}
