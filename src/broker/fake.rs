//! Deterministic broker for tests.  Records every call it receives.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::broker::{target_strike, Broker, InstrumentLocator, OrderPlacer, QuoteProvider};
use crate::error::BrokerError;
use crate::models::{Instrument, OrderRequest, Quote, Side};

pub(crate) struct FakeBroker {
    pub index_price:     f64,
    pub default_premium: f64,
    pub strike_step:     f64,
    pub premiums:        HashMap<String, f64>,
    pub failing_quotes:  HashSet<String>,
    pub unlisted:        bool,
    pub reject_orders:   bool,
    /// (side, reference_price, gap) per lookup.
    pub lookups:         Mutex<Vec<(Side, f64, f64)>>,
    pub quoted:          Mutex<Vec<String>>,
    pub orders:          Mutex<Vec<OrderRequest>>,
    pub observed:        Mutex<Vec<f64>>,
}

impl FakeBroker {
    pub fn new(index_price: f64) -> Self {
        Self {
            index_price,
            default_premium: 50.0,
            strike_step:     50.0,
            premiums:        HashMap::new(),
            failing_quotes:  HashSet::new(),
            unlisted:        false,
            reject_orders:   false,
            lookups:         Mutex::new(Vec::new()),
            quoted:          Mutex::new(Vec::new()),
            orders:          Mutex::new(Vec::new()),
            observed:        Mutex::new(Vec::new()),
        }
    }

    pub fn with_premium(mut self, symbol: &str, premium: f64) -> Self {
        self.premiums.insert(symbol.to_string(), premium);
        self
    }

    pub fn with_failing_quote(mut self, symbol: &str) -> Self {
        self.failing_quotes.insert(symbol.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<(Side, f64, f64)> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn quoted(&self) -> Vec<String> {
        self.quoted.lock().unwrap().clone()
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteProvider for FakeBroker {
    async fn get_quote(&self, symbol: &str, exchange: &str) -> Result<Quote, BrokerError> {
        self.quoted.lock().unwrap().push(symbol.to_string());

        if self.failing_quotes.contains(symbol) {
            return Err(BrokerError::QuoteUnavailable {
                symbol:   symbol.to_string(),
                exchange: exchange.to_string(),
            });
        }

        let last_price = if symbol.ends_with("PE") || symbol.ends_with("CE") {
            self.premiums.get(symbol).copied().unwrap_or(self.default_premium)
        } else {
            self.index_price
        };

        Ok(Quote { symbol: symbol.to_string(), last_price, instrument_token: None })
    }
}

impl InstrumentLocator for FakeBroker {
    fn find_instrument(
        &self,
        series_id: &str,
        option_type: Side,
        reference_price: f64,
        gap: f64,
    ) -> Option<Instrument> {
        self.lookups.lock().unwrap().push((option_type, reference_price, gap));
        if self.unlisted {
            return None;
        }

        let target = target_strike(option_type, reference_price, gap);
        let strike = (target / self.strike_step).round() * self.strike_step;

        Some(Instrument {
            trading_symbol:   format!("{series_id}{strike:.0}{}", option_type.as_str()),
            strike,
            option_type,
            instrument_token: 0,
            lot_size:         75,
            expiry:           None,
        })
    }
}

#[async_trait]
impl OrderPlacer for FakeBroker {
    async fn place_order(&self, request: &OrderRequest) -> Result<String, BrokerError> {
        let mut orders = self.orders.lock().unwrap();
        orders.push(request.clone());
        if self.reject_orders {
            return Err(BrokerError::Api("RMS: margin exceeds".into()));
        }
        Ok(format!("FAKE-{}", orders.len()))
    }
}

impl Broker for FakeBroker {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn observe_price(&self, price: f64) {
        self.observed.lock().unwrap().push(price);
    }
}
