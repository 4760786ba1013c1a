//! # engine::strike_search
//!
//! **Strike Search**: walk the strike toward the money until one pays at
//! least `min_price_to_sell`.
//!
//! ```text
//! gap = *_symbol_gap
//! loop:
//!   instrument = find_instrument(series, side, price, gap)   None → NoInstrument
//!   premium    = quote(instrument)                           Err  → QuoteFailure
//!   premium >= min_price_to_sell                             → Found
//!   gap -= nifty_lot_size       (stop: gap <= 0 or attempt ceiling)
//! ```

use tracing::{debug, warn};

use crate::broker::{InstrumentLocator, QuoteProvider};
use crate::config::StrategyConfig;
use crate::error::BrokerError;
use crate::models::{Instrument, Side};

#[derive(Debug, Clone, PartialEq)]
pub enum StrikeOutcome {
    Found { instrument: Instrument, premium: f64, gap: f64 },
    /// The locator had no strike near `current_price ∓ gap`.
    NoInstrument { gap: f64 },
    /// Every candidate quoted below the minimum premium.
    Exhausted { gap: f64, attempts: u32 },
}

pub async fn find<B>(
    side: Side,
    series_id: &str,
    current_price: f64,
    start_gap: f64,
    config: &StrategyConfig,
    broker: &B,
) -> Result<StrikeOutcome, BrokerError>
where
    B: QuoteProvider + InstrumentLocator + ?Sized,
{
    let mut gap = start_gap;
    let mut attempts = 0u32;

    loop {
        // ── 1. Locate ──────────────────────────────────────────────────────
        let Some(instrument) = broker.find_instrument(series_id, side, current_price, gap) else {
            warn!(%side, series_id, current_price, gap, "⚠️ No instrument near target strike");
            return Ok(StrikeOutcome::NoInstrument { gap });
        };

        // ── 2. Quote ───────────────────────────────────────────────────────
        let quote = broker
            .get_quote(&instrument.trading_symbol, &config.exchange)
            .await
            .map_err(|e| {
                warn!(%side, symbol = %instrument.trading_symbol, error = %e, "⚠️ Option quote failed");
                e
            })?;
        attempts += 1;

        // ── 3. Premium check ───────────────────────────────────────────────
        if quote.last_price >= config.min_price_to_sell {
            debug!(%side, symbol = %instrument.trading_symbol, premium = quote.last_price, gap, "strike selected");
            return Ok(StrikeOutcome::Found { instrument, premium: quote.last_price, gap });
        }

        // ── 4. Move closer to the money ────────────────────────────────────
        let next_gap = gap - config.nifty_lot_size;
        debug!(
            %side,
            symbol = %instrument.trading_symbol,
            premium = quote.last_price,
            min = config.min_price_to_sell,
            next_gap,
            "premium too low, narrowing"
        );

        if next_gap <= 0.0 || attempts >= config.max_strike_search_attempts {
            warn!(%side, gap, attempts, "⚠️ Strike search exhausted, no premium above minimum");
            return Ok(StrikeOutcome::Exhausted { gap, attempts });
        }
        gap = next_gap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::fake::FakeBroker;
    use crate::config::tests::make_config;

    const SERIES: &str = "NIFTY25JAN30";

    #[tokio::test]
    async fn test_retries_closer_until_premium_met() {
        let broker = FakeBroker::new(24500.0)
            .with_premium("NIFTY25JAN3024300PE", 10.0)
            .with_premium("NIFTY25JAN3024350PE", 20.0);
        let config = make_config();

        let outcome = find(Side::Pe, SERIES, 24500.0, 200.0, &config, &broker).await.unwrap();

        let StrikeOutcome::Found { instrument, premium, gap } = outcome else {
            panic!("expected Found");
        };
        assert_eq!(instrument.trading_symbol, "NIFTY25JAN3024350PE");
        assert_eq!(premium, 20.0);
        assert_eq!(gap, 150.0);
        assert_eq!(
            broker.lookups(),
            vec![(Side::Pe, 24500.0, 200.0), (Side::Pe, 24500.0, 150.0)]
        );
    }

    #[tokio::test]
    async fn test_first_candidate_accepted() {
        let broker = FakeBroker::new(24500.0);
        let config = make_config();

        let outcome = find(Side::Ce, SERIES, 24500.0, 200.0, &config, &broker).await.unwrap();
        assert!(matches!(outcome, StrikeOutcome::Found { gap, .. } if gap == 200.0));
        assert_eq!(broker.quoted(), vec!["NIFTY25JAN3024700CE".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_instrument() {
        let mut broker = FakeBroker::new(24500.0);
        broker.unlisted = true;
        let config = make_config();

        let outcome = find(Side::Pe, SERIES, 24500.0, 200.0, &config, &broker).await.unwrap();
        assert_eq!(outcome, StrikeOutcome::NoInstrument { gap: 200.0 });
        assert!(broker.quoted().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_when_gap_reaches_zero() {
        let mut broker = FakeBroker::new(24500.0);
        broker.default_premium = 5.0;
        let config = make_config();

        // 200 → 150 → 100 → 50 → (0 stops)
        let outcome = find(Side::Pe, SERIES, 24500.0, 200.0, &config, &broker).await.unwrap();
        assert_eq!(outcome, StrikeOutcome::Exhausted { gap: 50.0, attempts: 4 });
    }

    #[tokio::test]
    async fn test_exhausted_at_attempt_ceiling() {
        let mut broker = FakeBroker::new(24500.0);
        broker.default_premium = 1.0;
        let mut config = make_config();
        config.max_strike_search_attempts = 2;

        let outcome = find(Side::Ce, SERIES, 24500.0, 400.0, &config, &broker).await.unwrap();
        assert_eq!(outcome, StrikeOutcome::Exhausted { gap: 350.0, attempts: 2 });
    }

    #[tokio::test]
    async fn test_quote_failure_aborts() {
        let broker = FakeBroker::new(24500.0).with_failing_quote("NIFTY25JAN3024300PE");
        let config = make_config();

        let result = find(Side::Pe, SERIES, 24500.0, 200.0, &config, &broker).await;
        assert!(matches!(result, Err(BrokerError::QuoteUnavailable { .. })));
        assert_eq!(broker.lookups().len(), 1);
    }
}
