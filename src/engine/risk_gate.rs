//! # engine::risk_gate
//!
//! Last check between a trigger and the market: refuse any trigger whose
//! multiplier exceeds `sell_multiplier_threshold`.  A gap-through move that
//! large is treated as abnormal.

use tracing::warn;

use crate::models::Side;

#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Approved,
    Blocked(String),
}

#[derive(Debug, Clone, Copy)]
pub struct RiskGate {
    threshold: f64,
}

impl RiskGate {
    pub fn new(sell_multiplier_threshold: f64) -> Self {
        Self { threshold: sell_multiplier_threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn check(&self, side: Side, multiplier: u32) -> RiskDecision {
        if f64::from(multiplier) > self.threshold {
            let reason = format!(
                "{side} multiplier {multiplier} exceeds sell_multiplier_threshold {}",
                self.threshold
            );
            warn!(%side, multiplier, threshold = self.threshold, "🛑 [RISK] Trigger blocked");
            return RiskDecision::Blocked(reason);
        }
        RiskDecision::Approved
    }
}
