//! # models::instrument
//!
//! Option contracts returned by the broker's instrument lookup, and the
//! quote shape the core reads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Side;

/// An option contract the strategy may sell.
///
/// The core only reads `trading_symbol`, `strike` and `option_type`; the rest
/// is carried through for logging and the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub trading_symbol: String,
    pub strike: f64,
    pub option_type: Side,
    #[serde(default)]
    pub instrument_token: u64,
    #[serde(default)]
    pub lot_size: u32,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
}

/// Live quote for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub last_price: f64,
    pub instrument_token: Option<u64>,
}
