//! # models::order
//!
//! `OrderRequest` = what we hand to the broker (consumed immediately).
//! `OrderDetails` = what the order tracker keeps after the broker accepted it.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Side;

/// Order variety sent with every order.
pub const ORDER_VARIETY: &str = "regular";

/// Tag attached to every order so they can be filtered in the broker's order book.
pub const ORDER_TAG: &str = "Survivor";

// ─── Enums ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Carry-forward F&O position.
    Nrml,
    /// Intraday.
    Mis,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Nrml => "NRML",
            ProductType::Mis => "MIS",
        }
    }
}

// Parsed from CLI flags (`--order-type MARKET`), case-insensitive.

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY"  => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            other  => Err(format!("unknown transaction type '{other}' (BUY | SELL)")),
        }
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT"  => Ok(OrderType::Limit),
            other    => Err(format!("unknown order type '{other}' (MARKET | LIMIT)")),
        }
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NRML" => Ok(ProductType::Nrml),
            "MIS"  => Ok(ProductType::Mis),
            other  => Err(format!("unknown product type '{other}' (NRML | MIS)")),
        }
    }
}

// ─── OrderRequest ─────────────────────────────────────────────────────────────

/// Payload handed to [`crate::broker::OrderPlacer::place_order`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol:           String,
    pub quantity:         u32,
    /// `None` for market orders.
    pub price:            Option<f64>,
    pub transaction_type: TransactionType,
    pub order_type:       OrderType,
    pub variety:          &'static str,
    pub exchange:         String,
    pub product:          ProductType,
    pub tag:              &'static str,
}

// ─── OrderDetails ─────────────────────────────────────────────────────────────

/// One accepted order, as kept by the order tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order_id:         String,
    pub symbol:           String,
    pub side:             Side,
    pub transaction_type: TransactionType,
    pub quantity:         u32,
    /// `None` for market orders.
    pub price:            Option<f64>,
    pub timestamp:        DateTime<Utc>,
}

impl OrderDetails {
    pub fn from_request(order_id: String, side: Side, request: &OrderRequest) -> Self {
        Self {
            order_id,
            symbol:           request.symbol.clone(),
            side,
            transaction_type: request.transaction_type,
            quantity:         request.quantity,
            price:            request.price,
            timestamp:        Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_is_case_insensitive() {
        assert_eq!("market".parse::<OrderType>().unwrap(), OrderType::Market);
        assert_eq!("Sell".parse::<TransactionType>().unwrap(), TransactionType::Sell);
        assert_eq!("mis".parse::<ProductType>().unwrap(), ProductType::Mis);
        assert!("SL-M".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_details_copy_request() {
        let request = OrderRequest {
            symbol:           "NIFTY2580724700CE".into(),
            quantity:         150,
            price:            Some(18.5),
            transaction_type: TransactionType::Sell,
            order_type:       OrderType::Limit,
            variety:          ORDER_VARIETY,
            exchange:         "NFO".into(),
            product:          ProductType::Nrml,
            tag:              ORDER_TAG,
        };
        let details = OrderDetails::from_request("250807000001".into(), Side::Ce, &request);

        assert_eq!(details.symbol, request.symbol);
        assert_eq!(details.quantity, 150);
        assert_eq!(details.price, Some(18.5));
        assert_eq!(details.side, Side::Ce);

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["transaction_type"], "SELL");
        assert_eq!(json["side"], "CE");
    }
}
