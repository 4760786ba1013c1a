//! # broker::paper
//!
//! In-process broker for dry runs.  Nothing leaves the process.
//!
//! * Spot: the last tick price the strategy saw (`Broker::observe_price`).
//! * Chain: 50-point strikes within ±3000 of the lookup's reference price.
//! * Premium: intrinsic value + a time value that decays with distance
//!   out of the money, rounded to the 0.05 tick.
//! * Orders are always accepted with an id `PAPER-xxxxxxxx`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::broker::{target_strike, Broker, InstrumentLocator, OrderPlacer, QuoteProvider};
use crate::error::BrokerError;
use crate::models::{Instrument, OrderRequest, Quote, Side};

const STRIKE_STEP: f64 = 50.0;
const CHAIN_HALF_WIDTH: f64 = 3000.0;
const ATM_TIME_VALUE: f64 = 180.0;
const DECAY_POINTS: f64 = 120.0;
const TICK_SIZE: f64 = 0.05;
const LOT_SIZE: u32 = 75;

pub struct PaperBroker {
    index_symbol: String,
    /// Last index level seen, stored as `f64::to_bits`.
    spot: AtomicU64,
    /// trading symbol → (strike, option type) for every contract handed out.
    listed: Mutex<HashMap<String, (f64, Side)>>,
}

impl PaperBroker {
    pub fn new(index_symbol: &str, spot: f64) -> Self {
        Self {
            index_symbol: index_symbol.to_string(),
            spot: AtomicU64::new(spot.to_bits()),
            listed: Mutex::new(HashMap::new()),
        }
    }

    pub fn spot(&self) -> f64 {
        f64::from_bits(self.spot.load(Ordering::Relaxed))
    }

    fn set_spot(&self, spot: f64) {
        self.spot.store(spot.to_bits(), Ordering::Relaxed);
    }

    fn is_index(&self, symbol: &str) -> bool {
        let bare = symbol.rsplit(':').next().unwrap_or(symbol);
        bare == self.index_symbol || symbol == self.index_symbol
    }
}

/// Simulated option premium for `strike` with the index at `spot`.
pub fn premium(option_type: Side, strike: f64, spot: f64) -> f64 {
    let moneyness = match option_type {
        Side::Pe => strike - spot,
        Side::Ce => spot - strike,
    };
    let intrinsic = moneyness.max(0.0);
    let otm = (-moneyness).max(0.0);
    let value = intrinsic + ATM_TIME_VALUE * (-otm / DECAY_POINTS).exp();
    ((value / TICK_SIZE).round() * TICK_SIZE).max(TICK_SIZE)
}

/// Nearest listed strike; an exact half-way target snaps down.
fn snap_strike(target: f64) -> f64 {
    ((target / STRIKE_STEP) - 0.5).ceil() * STRIKE_STEP
}

#[async_trait]
impl QuoteProvider for PaperBroker {
    async fn get_quote(&self, symbol: &str, exchange: &str) -> Result<Quote, BrokerError> {
        if self.is_index(symbol) {
            return Ok(Quote {
                symbol:           symbol.to_string(),
                last_price:       self.spot(),
                instrument_token: None,
            });
        }

        let listed = self
            .listed
            .lock()
            .map_err(|_| BrokerError::Api("paper chain lock poisoned".into()))?
            .get(symbol)
            .copied();

        match listed {
            Some((strike, option_type)) => Ok(Quote {
                symbol:           symbol.to_string(),
                last_price:       premium(option_type, strike, self.spot()),
                instrument_token: None,
            }),
            None => Err(BrokerError::QuoteUnavailable {
                symbol:   symbol.to_string(),
                exchange: exchange.to_string(),
            }),
        }
    }
}

impl InstrumentLocator for PaperBroker {
    fn find_instrument(
        &self,
        series_id: &str,
        option_type: Side,
        reference_price: f64,
        gap: f64,
    ) -> Option<Instrument> {
        let strike = snap_strike(target_strike(option_type, reference_price, gap));
        if strike <= 0.0 || (strike - reference_price).abs() > CHAIN_HALF_WIDTH {
            return None;
        }

        let trading_symbol = format!("{series_id}{strike:.0}{}", option_type.as_str());
        if let Ok(mut listed) = self.listed.lock() {
            listed.insert(trading_symbol.clone(), (strike, option_type));
        }

        Some(Instrument {
            trading_symbol,
            strike,
            option_type,
            instrument_token: 0,
            lot_size: LOT_SIZE,
            expiry: None,
        })
    }
}

#[async_trait]
impl OrderPlacer for PaperBroker {
    async fn place_order(&self, request: &OrderRequest) -> Result<String, BrokerError> {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        let order_id = format!("PAPER-{}", &simple[..8]);

        info!(
            %order_id,
            symbol   = %request.symbol,
            quantity = request.quantity,
            side     = %request.transaction_type.as_str(),
            "🎭 [PAPER] Order filled"
        );

        Ok(order_id)
    }
}

impl Broker for PaperBroker {
    fn name(&self) -> &'static str {
        "paper"
    }

    fn observe_price(&self, price: f64) {
        self.set_spot(price);
    }
}
