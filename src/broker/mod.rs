//! # broker
//!
//! The narrow seams the strategy talks to the outside world through.
//!
//! | Trait               | Used by                         |
//! |---------------------|---------------------------------|
//! | [`QuoteProvider`]   | initialization, strike search   |
//! | [`InstrumentLocator`] | strike search                 |
//! | [`OrderPlacer`]     | trade executor                  |
//! | [`OrderRecorder`]   | trade executor (after success)  |
//!
//! Adapters: [`kite::KiteBroker`] (Zerodha Kite Connect REST) and
//! [`paper::PaperBroker`] (in-process simulation).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BrokerKind, RuntimeConfig, StrategyConfig};
use crate::error::{BrokerError, ConfigError};
use crate::models::{Instrument, OrderDetails, OrderRequest, Quote, Side};

pub mod instruments;
pub mod kite;
pub mod paper;

#[cfg(test)]
pub(crate) mod fake;

pub use instruments::InstrumentBook;

// ─── Core-facing traits ───────────────────────────────────────────────────────

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Last traded price of `symbol` on `exchange`.
    async fn get_quote(&self, symbol: &str, exchange: &str) -> Result<Quote, BrokerError>;
}

pub trait InstrumentLocator: Send + Sync {
    /// Option of `series_id` / `option_type` whose strike is nearest to
    /// `reference_price - gap` (PE) or `reference_price + gap` (CE).
    fn find_instrument(
        &self,
        series_id: &str,
        option_type: Side,
        reference_price: f64,
        gap: f64,
    ) -> Option<Instrument>;
}

#[async_trait]
pub trait OrderPlacer: Send + Sync {
    /// Returns the broker's order id.
    async fn place_order(&self, request: &OrderRequest) -> Result<String, BrokerError>;
}

#[async_trait]
pub trait OrderRecorder: Send + Sync {
    async fn record_order(&self, details: OrderDetails);
}

/// Everything the strategy needs from a broker, behind one trait object.
pub trait Broker: QuoteProvider + InstrumentLocator + OrderPlacer {
    fn name(&self) -> &'static str;

    /// Called with every usable tick price before the strategy acts on it.
    /// Live brokers have their own market data and ignore it.
    fn observe_price(&self, _price: f64) {}
}

/// Strike the locator aims for before snapping to a listed strike.
#[inline]
pub fn target_strike(option_type: Side, reference_price: f64, gap: f64) -> f64 {
    match option_type {
        Side::Pe => reference_price - gap,
        Side::Ce => reference_price + gap,
    }
}

// ─── Factory ──────────────────────────────────────────────────────────────────

/// Wire up the adapter selected by `BROKER_NAME`.
pub async fn build_broker(
    runtime: &RuntimeConfig,
    strategy: &StrategyConfig,
) -> anyhow::Result<Arc<dyn Broker>> {
    match runtime.broker {
        BrokerKind::Zerodha => {
            let (Some(api_key), Some(access_token)) =
                (runtime.kite_api_key.clone(), runtime.kite_access_token.clone())
            else {
                return Err(ConfigError::Invalid(
                    "BROKER_NAME=zerodha requires KITE_API_KEY and KITE_ACCESS_TOKEN".into(),
                )
                .into());
            };

            let broker = kite::KiteBroker::connect(api_key, access_token, &strategy.exchange).await?;
            info!(
                instruments = broker.instrument_count(),
                puts = broker.listed(Side::Pe),
                calls = broker.listed(Side::Ce),
                "🔗 Kite broker ready"
            );
            Ok(Arc::new(broker))
        }
        BrokerKind::Paper => {
            info!(spot = runtime.paper_spot, "🎭 Paper broker ready, no orders leave this process");
            Ok(Arc::new(paper::PaperBroker::new(&strategy.index_symbol, runtime.paper_spot)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_strike() {
        assert_eq!(target_strike(Side::Pe, 24500.0, 200.0), 24300.0);
        assert_eq!(target_strike(Side::Ce, 24500.0, 200.0), 24700.0);
    }

    #[tokio::test]
    async fn test_zerodha_without_credentials_is_fatal() {
        let runtime = RuntimeConfig {
            broker:              BrokerKind::Zerodha,
            kite_api_key:        Some("key".into()),
            kite_access_token:   None,
            bind_addr:           "127.0.0.1:0".into(),
            tick_queue_capacity: 16,
            order_journal:       None,
            api_key:             None,
            paper_spot:          24500.0,
        };
        let strategy = crate::config::tests::make_config();

        let err = build_broker(&runtime, &strategy).await.err().unwrap();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[tokio::test]
    async fn test_paper_broker_selected() {
        let runtime = RuntimeConfig {
            broker:              BrokerKind::Paper,
            kite_api_key:        None,
            kite_access_token:   None,
            bind_addr:           "127.0.0.1:0".into(),
            tick_queue_capacity: 16,
            order_journal:       None,
            api_key:             None,
            paper_spot:          24500.0,
        };
        let strategy = crate::config::tests::make_config();

        let broker = build_broker(&runtime, &strategy).await.unwrap();
        assert_eq!(broker.name(), "paper");
    }
}
