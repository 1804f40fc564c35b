// In crates/analytics/src/types.rs

use core_types::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The broad market trend read from an index's daily closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketRegime {
    Bull,
    Bear,
    Sideways,
    /// Not enough history to tell.
    Unknown,
}

impl MarketRegime {
    /// Whether the risk layer should apply its bear-market position cap.
    pub fn is_bear(&self) -> bool {
        *self == MarketRegime::Bear
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketRegime::Bull => "bull",
            MarketRegime::Bear => "bear",
            MarketRegime::Sideways => "sideways",
            MarketRegime::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The figures a regime call is based on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeSignals {
    pub sma_50: Decimal,
    pub sma_200: Decimal,
    /// Annualised volatility of the last 19 daily returns.
    pub volatility: f64,
    pub regime: MarketRegime,
}

/// One line of the end-of-day portfolio report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRow {
    pub symbol: Symbol,
    pub sector: String,
    pub shares: Decimal,
    pub cost_basis: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub current_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub stop_breached: bool,
}
