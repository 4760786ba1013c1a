//! # models::side
//!
//! The two independent trackers the strategy keeps: one for **PE** sells
//! (triggered by upward moves) and one for **CE** sells (triggered by
//! downward moves).

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Side ─────────────────────────────────────────────────────────────────────

/// Which option type a tracker sells.
///
/// The side and the option type traded always coincide: the PE tracker sells
/// puts, the CE tracker sells calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "CE")]
    Ce,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Pe, Side::Ce];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Pe => "PE",
            Side::Ce => "CE",
        }
    }

    /// Parse the option-type suffix used by instrument masters (`"PE"` / `"CE"`).
    pub fn from_option_type(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PE" => Some(Side::Pe),
            "CE" => Some(Side::Ce),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── SideState ────────────────────────────────────────────────────────────────

/// Mutable per-side state. Lives as long as the strategy does.
///
/// `reference_price` is moved by the trigger evaluator (on a trigger) and by
/// the reset manager (on a favorable retracement).  `armed` flips to `true`
/// after the first accepted order on this side and is never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideState {
    pub reference_price: f64,
    pub armed: bool,
}

impl SideState {
    pub fn new(reference_price: f64) -> Self {
        Self {
            reference_price,
            armed: false,
        }
    }
}
