//! # cli
//!
//! Command-line flags.  Every strategy parameter can be overridden from the
//! command line; anything left unset keeps the value from the TOML file.
//!
//! ```bash
//! survivor --pe-gap 25 --ce-gap 25 --pe-quantity 50
//! survivor --show-config
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::config::{StrategyConfig, DEFAULT_CONFIG_PATH};
use crate::models::{OrderType, ProductType, TransactionType};

#[derive(Debug, Parser)]
#[command(
    name = "survivor",
    version,
    about = "Survivor options-selling engine: sells OTM options as the index moves away from its reference"
)]
pub struct Args {
    /// Strategy file (TOML, `[default]` table)
    #[arg(long, env = "SURVIVOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config_file: PathBuf,

    /// Print the merged configuration and exit
    #[arg(long)]
    pub show_config: bool,

    // ── Index & series ───────────────────────────────────────────────────────
    /// Option series prefix, e.g. NIFTY25807
    #[arg(long)]
    pub symbol_initials: Option<String>,
    #[arg(long)]
    pub index_symbol: Option<String>,
    #[arg(long)]
    pub index_exchange: Option<String>,

    // ── Orders ───────────────────────────────────────────────────────────────
    #[arg(long)]
    pub exchange: Option<String>,
    /// MARKET | LIMIT
    #[arg(long)]
    pub order_type: Option<OrderType>,
    /// NRML | MIS
    #[arg(long)]
    pub product_type: Option<ProductType>,
    /// BUY | SELL
    #[arg(long)]
    pub trans_type: Option<TransactionType>,

    // ── Gaps ─────────────────────────────────────────────────────────────────
    /// Upward move (points) that triggers a PE sell
    #[arg(long)]
    pub pe_gap: Option<f64>,
    /// Downward move (points) that triggers a CE sell
    #[arg(long)]
    pub ce_gap: Option<f64>,
    #[arg(long)]
    pub pe_symbol_gap: Option<f64>,
    #[arg(long)]
    pub ce_symbol_gap: Option<f64>,
    #[arg(long)]
    pub pe_reset_gap: Option<f64>,
    #[arg(long)]
    pub ce_reset_gap: Option<f64>,

    // ── Sizing & references ──────────────────────────────────────────────────
    #[arg(long)]
    pub pe_quantity: Option<u32>,
    #[arg(long)]
    pub ce_quantity: Option<u32>,
    /// 0 = start from the live index price
    #[arg(long)]
    pub pe_start_point: Option<f64>,
    /// 0 = start from the live index price
    #[arg(long)]
    pub ce_start_point: Option<f64>,

    // ── Risk & search ────────────────────────────────────────────────────────
    #[arg(long)]
    pub min_price_to_sell: Option<f64>,
    #[arg(long)]
    pub sell_multiplier_threshold: Option<f64>,
    #[arg(long)]
    pub nifty_lot_size: Option<f64>,
    #[arg(long)]
    pub max_strike_search_attempts: Option<u32>,
}

/// Copy `Some(v)` into `target` and remember the key.
macro_rules! override_fields {
    ($args:expr, $cfg:expr, $applied:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $args.$field.clone() {
                $cfg.$field = value;
                $applied.push(stringify!($field));
            }
        )+
    };
}

impl Args {
    /// Apply every flag that was given on top of `config`.
    /// Returns the names of the overridden keys, in declaration order.
    pub fn apply_overrides(&self, config: &mut StrategyConfig) -> Vec<&'static str> {
        let mut applied = Vec::new();
        override_fields!(self, config, applied;
            symbol_initials,
            index_symbol,
            index_exchange,
            exchange,
            order_type,
            product_type,
            trans_type,
            pe_gap,
            ce_gap,
            pe_symbol_gap,
            ce_symbol_gap,
            pe_reset_gap,
            ce_reset_gap,
            pe_quantity,
            ce_quantity,
            pe_start_point,
            ce_start_point,
            min_price_to_sell,
            sell_multiplier_threshold,
            nifty_lot_size,
            max_strike_search_attempts,
        );
        applied
    }
}
