//! # config
//!
//! Two layers of configuration:
//!
//! * [`StrategyConfig`]: the trading parameters.  Loaded once from the
//!   `[default]` table of a TOML file, then overridden by CLI flags
//!   (see [`crate::cli`]).  Immutable after startup.
//! * [`RuntimeConfig`]: process wiring (broker, bind address, queue size),
//!   read from environment variables.
//!
//! ```toml
//! [default]
//! symbol_initials = "NIFTY25807"
//! index_symbol    = "NIFTY 50"
//! pe_gap          = 20
//! # ...
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{OrderType, ProductType, Side, TransactionType};

/// Default location of the strategy file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/survivor.toml";

// ─── StrategyConfig ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    // ── Index & series ───────────────────────────────────────────────────────
    /// Option series prefix, e.g. `NIFTY25807` (underlying + expiry code).
    pub symbol_initials: String,
    /// Underlying index whose moves drive the strategy, e.g. `NIFTY 50`.
    pub index_symbol:    String,
    /// Exchange the index is quoted on.
    #[serde(default = "default_index_exchange")]
    pub index_exchange:  String,

    // ── Orders ───────────────────────────────────────────────────────────────
    /// Exchange options are traded on (`NFO`).
    pub exchange:     String,
    pub order_type:   OrderType,
    pub product_type: ProductType,
    pub trans_type:   TransactionType,

    // ── Trigger gaps ─────────────────────────────────────────────────────────
    pub pe_gap: f64,
    pub ce_gap: f64,

    // ── Strike distance from spot ────────────────────────────────────────────
    pub pe_symbol_gap: f64,
    pub ce_symbol_gap: f64,

    // ── Reset gaps ───────────────────────────────────────────────────────────
    pub pe_reset_gap: f64,
    pub ce_reset_gap: f64,

    // ── Position sizing ──────────────────────────────────────────────────────
    pub pe_quantity: u32,
    pub ce_quantity: u32,

    // ── Starting references (0 = use the live index price) ───────────────────
    #[serde(default)]
    pub pe_start_point: f64,
    #[serde(default)]
    pub ce_start_point: f64,

    // ── Risk ─────────────────────────────────────────────────────────────────
    /// Options quoting below this premium are skipped.
    pub min_price_to_sell:         f64,
    /// Largest multiplier a single trigger may trade.
    pub sell_multiplier_threshold: f64,

    // ── Strike search ────────────────────────────────────────────────────────
    /// Step by which the strike distance shrinks when premium is too low.
    pub nifty_lot_size: f64,
    /// Hard ceiling on candidates quoted per search.
    #[serde(default = "default_max_strike_search_attempts")]
    pub max_strike_search_attempts: u32,
}

fn default_index_exchange() -> String {
    "NSE".to_string()
}

fn default_max_strike_search_attempts() -> u32 {
    20
}

/// Per-side slice of [`StrategyConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideParams {
    pub gap:         f64,
    pub symbol_gap:  f64,
    pub reset_gap:   f64,
    pub quantity:    u32,
    pub start_point: f64,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    default: StrategyConfig,
}

impl StrategyConfig {
    /// Read and parse the `[default]` table of a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        Ok(file.default)
    }

    pub fn side(&self, side: Side) -> SideParams {
        match side {
            Side::Pe => SideParams {
                gap:         self.pe_gap,
                symbol_gap:  self.pe_symbol_gap,
                reset_gap:   self.pe_reset_gap,
                quantity:    self.pe_quantity,
                start_point: self.pe_start_point,
            },
            Side::Ce => SideParams {
                gap:         self.ce_gap,
                symbol_gap:  self.ce_symbol_gap,
                reset_gap:   self.ce_reset_gap,
                quantity:    self.ce_quantity,
                start_point: self.ce_start_point,
            },
        }
    }

    // ─── Validation ──────────────────────────────────────────────────────────

    /// Check every invariant the engine relies on.  Any failure is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.symbol_initials.trim().len() < 9 {
            problems.push(format!(
                "symbol_initials '{}' must be at least 9 characters (underlying + expiry)",
                self.symbol_initials
            ));
        }
        if self.index_symbol.trim().is_empty() {
            problems.push("index_symbol must not be empty".to_string());
        }
        if self.exchange.trim().is_empty() {
            problems.push("exchange must not be empty".to_string());
        }

        let positive = [
            ("pe_gap", self.pe_gap),
            ("ce_gap", self.ce_gap),
            ("pe_symbol_gap", self.pe_symbol_gap),
            ("ce_symbol_gap", self.ce_symbol_gap),
            ("pe_reset_gap", self.pe_reset_gap),
            ("ce_reset_gap", self.ce_reset_gap),
            ("nifty_lot_size", self.nifty_lot_size),
        ];
        for (name, value) in positive {
            // `!(v > 0)` also rejects NaN
            if !(value > 0.0) {
                problems.push(format!("{name} must be positive (got {value})"));
            }
        }

        if self.pe_quantity == 0 {
            problems.push("pe_quantity must be positive".to_string());
        }
        if self.ce_quantity == 0 {
            problems.push("ce_quantity must be positive".to_string());
        }
        if !(self.pe_start_point >= 0.0) || !(self.ce_start_point >= 0.0) {
            problems.push("start points must be 0 (use live price) or a positive level".to_string());
        }
        if !(self.min_price_to_sell >= 0.0) {
            problems.push(format!("min_price_to_sell must not be negative (got {})", self.min_price_to_sell));
        }
        if !(self.sell_multiplier_threshold >= 1.0) {
            problems.push(format!(
                "sell_multiplier_threshold must be at least 1 (got {})",
                self.sell_multiplier_threshold
            ));
        }
        if self.max_strike_search_attempts == 0 {
            problems.push("max_strike_search_attempts must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    /// Parameters still equal to the values shipped in the sample file.
    ///
    /// Every key unchanged → the user never edited the file, refuse to start.
    pub fn unchanged_defaults(&self) -> Vec<&'static str> {
        let checks: [(&'static str, bool); 13] = [
            ("symbol_initials", self.symbol_initials == "NIFTY25807"),
            ("pe_gap", self.pe_gap == 20.0),
            ("ce_gap", self.ce_gap == 20.0),
            ("pe_quantity", self.pe_quantity == 75),
            ("ce_quantity", self.ce_quantity == 75),
            ("pe_symbol_gap", self.pe_symbol_gap == 200.0),
            ("ce_symbol_gap", self.ce_symbol_gap == 200.0),
            ("min_price_to_sell", self.min_price_to_sell == 15.0),
            ("pe_reset_gap", self.pe_reset_gap == 30.0),
            ("ce_reset_gap", self.ce_reset_gap == 30.0),
            ("pe_start_point", self.pe_start_point == 0.0),
            ("ce_start_point", self.ce_start_point == 0.0),
            ("sell_multiplier_threshold", self.sell_multiplier_threshold == 5.0),
        ];

        checks
            .into_iter()
            .filter_map(|(key, unchanged)| unchanged.then_some(key))
            .collect()
    }

    /// `validate()` plus the shipped-defaults check.  Returns the keys that
    /// are still at their defaults so the caller can warn about them.
    pub fn check_startup(&self) -> Result<Vec<&'static str>, ConfigError> {
        self.validate()?;
        let unchanged = self.unchanged_defaults();
        if unchanged.len() == 13 {
            return Err(ConfigError::AllDefaults);
        }
        Ok(unchanged)
    }

    // ─── Display ─────────────────────────────────────────────────────────────

    /// Human-readable dump used by `--show-config`.
    pub fn render_summary(&self) -> String {
        let rule = "=".repeat(80);
        let mut out = String::new();

        let _ = writeln!(out, "\n{rule}\nSURVIVOR STRATEGY CONFIGURATION\n{rule}");

        let sections: [(&str, Vec<(&str, String, &str)>); 7] = [
            ("Index & Symbol Configuration", vec![
                ("index_symbol", self.index_symbol.clone(), ""),
                ("index_exchange", self.index_exchange.clone(), ""),
                ("symbol_initials", self.symbol_initials.clone(), ""),
            ]),
            ("Exchange & Order Management", vec![
                ("exchange", self.exchange.clone(), ""),
                ("order_type", self.order_type.as_str().to_string(), ""),
                ("product_type", self.product_type.as_str().to_string(), ""),
                ("trans_type", self.trans_type.as_str().to_string(), ""),
            ]),
            ("Gap Parameters (Trade Triggers)", vec![
                ("pe_gap", self.pe_gap.to_string(), "points"),
                ("ce_gap", self.ce_gap.to_string(), "points"),
                ("pe_reset_gap", self.pe_reset_gap.to_string(), "points"),
                ("ce_reset_gap", self.ce_reset_gap.to_string(), "points"),
            ]),
            ("Strike Selection (Distance from Spot)", vec![
                ("pe_symbol_gap", self.pe_symbol_gap.to_string(), "points from spot"),
                ("ce_symbol_gap", self.ce_symbol_gap.to_string(), "points from spot"),
                ("nifty_lot_size", self.nifty_lot_size.to_string(), "points per retry"),
                ("max_strike_search_attempts", self.max_strike_search_attempts.to_string(), ""),
            ]),
            ("Position Sizing", vec![
                ("pe_quantity", self.pe_quantity.to_string(), "units"),
                ("ce_quantity", self.ce_quantity.to_string(), "units"),
            ]),
            ("Reference Points (Starting Values)", vec![
                ("pe_start_point", self.pe_start_point.to_string(), ""),
                ("ce_start_point", self.ce_start_point.to_string(), ""),
            ]),
            ("Risk Management", vec![
                ("min_price_to_sell", self.min_price_to_sell.to_string(), "rupees"),
                ("sell_multiplier_threshold", self.sell_multiplier_threshold.to_string(), "x"),
            ]),
        ];

        for (title, fields) in sections {
            let _ = writeln!(out, "\n{title}:\n{}", "-".repeat(title.len()));
            for (name, value, unit) in fields {
                let _ = writeln!(out, "  {}", format!("{name:27}: {value} {unit}").trim_end());
            }
        }

        let _ = writeln!(out, "\n{rule}\nTRADING LOGIC SUMMARY:\n{rule}");
        let _ = writeln!(out, "• PE sells triggered when {} rises >{} points", self.index_symbol, self.pe_gap);
        let _ = writeln!(out, "• CE sells triggered when {} falls >{} points", self.index_symbol, self.ce_gap);
        let _ = writeln!(out, "• PE strikes selected ~{} points below spot", self.pe_symbol_gap);
        let _ = writeln!(out, "• CE strikes selected ~{} points above spot", self.ce_symbol_gap);
        let _ = writeln!(out, "• Minimum option premium: ₹{}", self.min_price_to_sell);
        let _ = writeln!(out, "• Maximum position multiplier: {}x", self.sell_multiplier_threshold);
        let _ = writeln!(out, "{rule}");

        out
    }
}

// ─── RuntimeConfig ────────────────────────────────────────────────────────────

/// Which broker adapter to wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerKind {
    /// Zerodha Kite Connect REST API.
    Zerodha,
    /// In-process simulated broker.
    Paper,
}

impl BrokerKind {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_lowercase().as_str() {
            "zerodha" | "kite" => Ok(BrokerKind::Zerodha),
            "paper" => Ok(BrokerKind::Paper),
            other => Err(ConfigError::Invalid(format!(
                "invalid broker name '{other}' (use 'zerodha' or 'paper')"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub broker:              BrokerKind,
    pub kite_api_key:        Option<String>,
    pub kite_access_token:   Option<String>,
    pub bind_addr:           String,
    pub tick_queue_capacity: usize,
    pub order_journal:       Option<PathBuf>,
    /// `None` = every route is open (dev mode).
    pub api_key:             Option<String>,
    /// Index level the paper broker quotes before the first tick arrives.
    pub paper_spot:          f64,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let broker = BrokerKind::parse(&env_string("BROKER_NAME", "paper"))?;

        let capacity = env_parse("TICK_QUEUE_CAPACITY", 1024usize);
        if capacity == 0 {
            return Err(ConfigError::Invalid("TICK_QUEUE_CAPACITY must be positive".into()));
        }

        Ok(Self {
            broker,
            kite_api_key:        env_opt("KITE_API_KEY"),
            kite_access_token:   env_opt("KITE_ACCESS_TOKEN"),
            bind_addr:           env_string("BIND_ADDR", "0.0.0.0:3000"),
            tick_queue_capacity: capacity,
            order_journal:       env_opt("ORDER_JOURNAL").map(PathBuf::from),
            api_key:             env_opt("API_KEY"),
            paper_spot:          env_parse("PAPER_SPOT", 24500.0),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
fn env_string(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"
        [default]
        symbol_initials           = "NIFTY25807"
        index_symbol              = "NIFTY 50"
        exchange                  = "NFO"
        order_type                = "MARKET"
        product_type              = "NRML"
        trans_type                = "SELL"
        pe_gap                    = 20
        ce_gap                    = 20
        pe_symbol_gap             = 200
        ce_symbol_gap             = 200
        pe_reset_gap              = 30
        ce_reset_gap              = 30
        pe_quantity               = 75
        ce_quantity               = 75
        pe_start_point            = 0
        ce_start_point            = 0
        min_price_to_sell         = 15
        sell_multiplier_threshold = 5
        nifty_lot_size            = 50
    "#;

    /// Shipped defaults with the series and gaps edited, as a user would.
    pub(crate) fn make_config() -> StrategyConfig {
        let mut config = StrategyConfig::from_toml_str(SAMPLE, "test").unwrap();
        config.symbol_initials = "NIFTY25JAN30".to_string();
        config.pe_gap = 25.0;
        config.ce_gap = 25.0;
        config
    }

    #[test]
    fn test_parse_sample_with_defaults() {
        let config = StrategyConfig::from_toml_str(SAMPLE, "test").unwrap();
        assert_eq!(config.index_exchange, "NSE");
        assert_eq!(config.max_strike_search_attempts, 20);
        assert_eq!(config.order_type, OrderType::Market);
        assert_eq!(config.trans_type, TransactionType::Sell);
        assert_eq!(config.pe_gap, 20.0);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = StrategyConfig::from_toml_str("[default]\npe_gap = \"x\"", "bad.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_side_params() {
        let config = make_config();
        let pe = config.side(Side::Pe);
        assert_eq!(pe.gap, 25.0);
        assert_eq!(pe.symbol_gap, 200.0);
        assert_eq!(pe.quantity, 75);
        let ce = config.side(Side::Ce);
        assert_eq!(ce.reset_gap, 30.0);
    }

    #[test]
    fn test_all_defaults_is_fatal() {
        let config = StrategyConfig::from_toml_str(SAMPLE, "test").unwrap();
        assert!(matches!(config.check_startup(), Err(ConfigError::AllDefaults)));
    }

    #[test]
    fn test_partial_defaults_are_reported() {
        let unchanged = make_config().check_startup().unwrap();
        assert!(!unchanged.contains(&"symbol_initials"));
        assert!(!unchanged.contains(&"pe_gap"));
        assert!(unchanged.contains(&"pe_quantity"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = make_config();
        config.ce_gap = 0.0;
        config.sell_multiplier_threshold = 0.5;
        config.pe_quantity = 0;
        config.symbol_initials = "NIFTY".to_string();

        let ConfigError::Invalid(msg) = config.validate().unwrap_err() else {
            panic!("expected Invalid");
        };
        assert!(msg.contains("ce_gap"));
        assert!(msg.contains("sell_multiplier_threshold"));
        assert!(msg.contains("pe_quantity"));
        assert!(msg.contains("symbol_initials"));
    }

    #[test]
    fn test_nan_gap_rejected() {
        let mut config = make_config();
        config.pe_reset_gap = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_summary_mentions_triggers() {
        let summary = make_config().render_summary();
        assert!(summary.contains("SURVIVOR STRATEGY CONFIGURATION"));
        assert!(summary.contains("PE sells triggered when NIFTY 50 rises >25 points"));
        assert!(summary.contains("nifty_lot_size"));
    }

    #[test]
    fn test_broker_kind_parse() {
        assert_eq!(BrokerKind::parse("Zerodha").unwrap(), BrokerKind::Zerodha);
        assert_eq!(BrokerKind::parse("paper").unwrap(), BrokerKind::Paper);
        assert!(BrokerKind::parse("fyers").is_err());
    }
}
