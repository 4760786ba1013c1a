//! # engine::executor
//!
//! **Trade Executor**: turn a selected strike into a broker order and record
//! it once the broker accepts.
//!
//! Failures are returned to the caller, which leaves the side unarmed.  Only
//! accepted orders reach the [`OrderRecorder`].

use tracing::{error, info};

use crate::broker::{OrderPlacer, OrderRecorder};
use crate::config::StrategyConfig;
use crate::error::BrokerError;
use crate::models::order::{ORDER_TAG, ORDER_VARIETY};
use crate::models::{Instrument, OrderDetails, OrderRequest, OrderType, Side};

// ─── Build Order ──────────────────────────────────────────────────────────────

/// MARKET orders carry no price; LIMIT orders are pinned to the observed premium.
pub fn build_order(instrument: &Instrument, quantity: u32, premium: f64, config: &StrategyConfig) -> OrderRequest {
    let price = match config.order_type {
        OrderType::Market => None,
        OrderType::Limit => Some(premium),
    };

    OrderRequest {
        symbol:           instrument.trading_symbol.clone(),
        quantity,
        price,
        transaction_type: config.trans_type,
        order_type:       config.order_type,
        variety:          ORDER_VARIETY,
        exchange:         config.exchange.clone(),
        product:          config.product_type,
        tag:              ORDER_TAG,
    }
}

// ─── Execute ──────────────────────────────────────────────────────────────────

pub async fn execute<B, R>(
    instrument: &Instrument,
    quantity: u32,
    side: Side,
    premium: f64,
    config: &StrategyConfig,
    broker: &B,
    recorder: &R,
) -> Result<OrderDetails, BrokerError>
where
    B: OrderPlacer + ?Sized,
    R: OrderRecorder + ?Sized,
{
    let request = build_order(instrument, quantity, premium, config);

    info!(
        %side,
        symbol     = %request.symbol,
        quantity,
        premium,
        order_type = request.order_type.as_str(),
        "🚀 [EXECUTOR] Placing order"
    );

    let order_id = broker.place_order(&request).await.map_err(|e| {
        error!(%side, symbol = %request.symbol, quantity, error = %e, "❌ [EXECUTOR] Order failed");
        e
    })?;

    let details = OrderDetails::from_request(order_id, side, &request);
    info!(%side, order_id = %details.order_id, symbol = %details.symbol, quantity, "✅ [EXECUTOR] Order accepted");

    recorder.record_order(details.clone()).await;
    Ok(details)
}
