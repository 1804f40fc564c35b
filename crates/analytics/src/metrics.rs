// In crates/analytics/src/metrics.rs

use crate::types::{MarketRegime, RegimeSignals};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

const LONG_WINDOW: usize = 200;
const SHORT_WINDOW: usize = 50;
const VOLATILITY_WINDOW: usize = 20;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const BULL_MAX_VOLATILITY: f64 = 0.20;

/// Today's loss as a positive fraction of start-of-day equity.
///
/// Zero on a flat or winning day, and when the starting equity is not positive.
pub fn daily_loss_pct(start_equity: Decimal, current_equity: Decimal) -> Decimal {
    if start_equity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((start_equity - current_equity) / start_equity).max(Decimal::ZERO)
}

/// Simple return from the first close to the last.
pub fn period_return(closes: &[Decimal]) -> Option<Decimal> {
    let first = *closes.first()?;
    let last = *closes.last()?;
    if first <= Decimal::ZERO {
        return None;
    }
    Some((last - first) / first)
}

/// Classifies the market from daily index closes, oldest first.
pub fn classify_regime(closes: &[Decimal]) -> MarketRegime {
    regime_signals(closes)
        .map(|signals| signals.regime)
        .unwrap_or(MarketRegime::Unknown)
}

/// Moving averages and volatility behind a regime call.
///
/// Returns `None` with fewer than 200 closes, or when a close in the volatility
/// window is not positive.
pub fn regime_signals(closes: &[Decimal]) -> Option<RegimeSignals> {
    if closes.len() < LONG_WINDOW {
        tracing::debug!(closes = closes.len(), "Not enough history to classify the regime.");
        return None;
    }

    let sma_50 = mean(&closes[closes.len() - SHORT_WINDOW..]);
    let sma_200 = mean(&closes[closes.len() - LONG_WINDOW..]);
    let volatility = annualised_volatility(&closes[closes.len() - VOLATILITY_WINDOW..])?;

    let regime = if sma_50 > sma_200 && volatility < BULL_MAX_VOLATILITY {
        MarketRegime::Bull
    } else if sma_50 < sma_200 {
        MarketRegime::Bear
    } else {
        MarketRegime::Sideways
    };

    Some(RegimeSignals { sma_50, sma_200, volatility, regime })
}

fn mean(values: &[Decimal]) -> Decimal {
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

/// Sample standard deviation of daily returns, scaled by √252.
fn annualised_volatility(window: &[Decimal]) -> Option<f64> {
    let returns = window
        .windows(2)
        .map(|w| {
            if w[0] <= Decimal::ZERO {
                return None;
            }
            (w[1] / w[0] - dec!(1)).to_f64()
        })
        .collect::<Option<Vec<f64>>>()?;
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean_return = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}
