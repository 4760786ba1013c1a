//! # engine
//!
//! The strategy core.  Leaf modules are pure or talk to the broker only
//! through the traits in [`crate::broker`]; [`strategy`] wires them into the
//! per-tick pipeline and [`runner`] feeds it from the tick queue.

pub mod executor;
pub mod reset;
pub mod risk_gate;
pub mod runner;
pub mod strategy;
pub mod strike_search;
pub mod trigger;
