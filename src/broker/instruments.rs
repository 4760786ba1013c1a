//! # broker::instruments
//!
//! In-memory option chain, loaded once from Kite's instrument master.
//!
//! Lookup rule: among the listed strikes of one series and option type, pick
//! the one nearest to the target strike, provided it lies within half the
//! series' strike increment.  Equidistant candidates resolve to the lower
//! strike.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::broker::target_strike;
use crate::models::{Instrument, Side};

/// One row of Kite's instrument master.  Columns are matched by header name;
/// the ones not listed here (`exchange_token`, `name`, `tick_size`, ...) are
/// ignored.
#[derive(Debug, Deserialize)]
struct KiteInstrumentRow {
    instrument_token: u64,
    tradingsymbol:    String,
    #[serde(default)]
    expiry:           String,
    strike:           f64,
    #[serde(default)]
    lot_size:         u32,
    instrument_type:  String,
}

impl KiteInstrumentRow {
    /// `None` for futures and equities.
    fn into_option(self) -> Option<Instrument> {
        let option_type = Side::from_option_type(&self.instrument_type)?;
        Some(Instrument {
            trading_symbol:   self.tradingsymbol,
            strike:           self.strike,
            option_type,
            instrument_token: self.instrument_token,
            lot_size:         self.lot_size,
            expiry:           NaiveDate::parse_from_str(&self.expiry, "%Y-%m-%d").ok(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstrumentBook {
    options: Vec<Instrument>,
}

impl InstrumentBook {
    #[cfg(test)]
    pub fn new(options: Vec<Instrument>) -> Self {
        Self { options }
    }

    /// Parse Kite's `/instruments/{exchange}` CSV.  Non-option rows and rows
    /// that fail to deserialize are skipped.
    pub fn from_kite_csv(text: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut options = Vec::new();
        let mut skipped = 0usize;

        for result in reader.deserialize::<KiteInstrumentRow>() {
            match result.ok().and_then(KiteInstrumentRow::into_option) {
                Some(instrument) => options.push(instrument),
                None => skipped += 1,
            }
        }

        debug!(options = options.len(), skipped, "instrument master parsed");
        Self { options }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn find(
        &self,
        series_id: &str,
        option_type: Side,
        reference_price: f64,
        gap: f64,
    ) -> Option<Instrument> {
        let chain: Vec<&Instrument> = self
            .options
            .iter()
            .filter(|i| i.option_type == option_type && i.trading_symbol.starts_with(series_id))
            .collect();

        let mut strikes: Vec<f64> = chain.iter().map(|i| i.strike).collect();
        strikes.sort_by(f64::total_cmp);
        strikes.dedup();
        let tolerance = strike_increment(&strikes).map_or(0.0, |inc| inc / 2.0);

        let target = target_strike(option_type, reference_price, gap);

        chain
            .into_iter()
            .filter(|i| (i.strike - target).abs() <= tolerance)
            .min_by(|a, b| {
                (a.strike - target)
                    .abs()
                    .total_cmp(&(b.strike - target).abs())
                    .then(a.strike.total_cmp(&b.strike))
            })
            .cloned()
    }

    /// Listed contracts per option type.
    pub fn strike_counts(&self) -> HashMap<Side, usize> {
        let mut counts = HashMap::new();
        for i in &self.options {
            *counts.entry(i.option_type).or_insert(0) += 1;
        }
        counts
    }
}

/// Smallest positive distance between consecutive distinct strikes.
fn strike_increment(sorted_strikes: &[f64]) -> Option<f64> {
    sorted_strikes
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .min_by(f64::total_cmp)
}
