//! # engine::trigger
//!
//! **Trigger Evaluator**: runs once per side per tick.
//!
//! ```text
//! PE:  diff = round(price - reference)   fires iff diff > pe_gap
//! CE:  diff = round(reference - price)   fires iff diff > ce_gap
//! multiplier = floor(diff / gap)
//! ```
//!
//! On a trigger the reference advances by `gap * multiplier` in the direction
//! of the move *before* risk or strike search run.  Nothing rolls it back.

use crate::models::{Side, SideState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerDecision {
    pub fired:      bool,
    pub multiplier: u32,
    /// Rounded move past the reference, in points (0 when price moved the other way).
    pub price_diff: f64,
}

impl TriggerDecision {
    const IDLE: Self = Self { fired: false, multiplier: 0, price_diff: 0.0 };
}

pub fn evaluate(side: Side, current_price: f64, state: &mut SideState, gap: f64) -> TriggerDecision {
    let raw = match side {
        Side::Pe => current_price - state.reference_price,
        Side::Ce => state.reference_price - current_price,
    };
    if raw <= 0.0 {
        return TriggerDecision::IDLE;
    }

    // half-to-even, so a 20.5 move stays at 20
    let price_diff = raw.round_ties_even();
    if price_diff <= gap {
        return TriggerDecision { price_diff, ..TriggerDecision::IDLE };
    }

    let multiplier = (price_diff / gap).floor() as u32;
    let advance = gap * f64::from(multiplier);
    match side {
        Side::Pe => state.reference_price += advance,
        Side::Ce => state.reference_price -= advance,
    }

    TriggerDecision { fired: true, multiplier, price_diff }
}
