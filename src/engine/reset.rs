//! # engine::reset
//!
//! **Reset Manager**: once a side has traded, pull its reference back toward
//! the market after a favorable retracement so the next trigger fires sooner.
//!
//! ```text
//! PE: reference - price > pe_reset_gap  → reference = price + pe_reset_gap
//! CE: price - reference > ce_reset_gap  → reference = price - ce_reset_gap
//! ```
//!
//! Unarmed sides are never touched.  Armed stays set, so the reset can keep
//! firing on later ticks.

use crate::models::{Side, SideState};

/// Returns the new reference when a reset was applied.
pub fn reset(side: Side, current_price: f64, state: &mut SideState, reset_gap: f64) -> Option<f64> {
    if !state.armed {
        return None;
    }

    let new_reference = match side {
        Side::Pe if state.reference_price - current_price > reset_gap => current_price + reset_gap,
        Side::Ce if current_price - state.reference_price > reset_gap => current_price - reset_gap,
        _ => return None,
    };

    state.reference_price = new_reference;
    Some(new_reference)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn make_armed(reference: f64) -> SideState {
        SideState { reference_price: reference, armed: true }
    }

    #[test]
    fn test_pe_reset_after_retracement() {
        let mut state = make_armed(24550.0);
        assert_eq!(reset(Side::Pe, 24480.0, &mut state, 50.0), Some(24530.0));
        assert_eq!(state.reference_price, 24530.0);
        assert!(state.armed);
    }

    #[test]
    fn test_ce_reset_after_retracement() {
        let mut state = make_armed(24400.0);
        assert_eq!(reset(Side::Ce, 24500.0, &mut state, 30.0), Some(24470.0));
    }

    #[test]
    fn test_unarmed_never_resets() {
        let mut state = SideState::new(24550.0);
        assert_eq!(reset(Side::Pe, 24000.0, &mut state, 50.0), None);
        assert_eq!(state.reference_price, 24550.0);
    }

    #[test]
    fn test_small_retracement_ignored() {
        let mut state = make_armed(24550.0);
        // exactly the reset gap is not enough
        assert_eq!(reset(Side::Pe, 24500.0, &mut state, 50.0), None);
        assert_eq!(state.reference_price, 24550.0);
    }

    #[test]
    fn test_reset_repeats_while_condition_holds() {
        let mut state = make_armed(24550.0);
        assert_eq!(reset(Side::Pe, 24480.0, &mut state, 50.0), Some(24530.0));
        assert_eq!(reset(Side::Pe, 24400.0, &mut state, 50.0), Some(24450.0));
        assert_eq!(reset(Side::Pe, 24440.0, &mut state, 50.0), None);
    }

    proptest! {
        /// An unarmed side is never relocated, whatever the price and gap.
        #[test]
        fn test_unarmed_never_resets_at_any_price(
            pe in any::<bool>(),
            reference in 10_000.0..30_000.0_f64,
            price in 10_000.0..30_000.0_f64,
            reset_gap in 0.0..500.0_f64,
        ) {
            let side = if pe { Side::Pe } else { Side::Ce };
            let mut state = SideState::new(reference);
            prop_assert_eq!(reset(side, price, &mut state, reset_gap), None);
            prop_assert_eq!(state.reference_price, reference);
            prop_assert!(!state.armed);
        }
    }
}
