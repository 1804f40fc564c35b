// In crates/core-types/src/types.rs

use crate::lenient::lenient_decimal;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sector assigned to positions and symbols with no usable classification.
pub const UNCLASSIFIED_SECTOR: &str = "unclassified";

/// A ticker identifier, e.g. "ABEO".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self(ticker.into())
    }

    /// Trims and upper-cases a ticker as it arrives from an upstream feed.
    pub fn normalized(ticker: &str) -> Self {
        Self(ticker.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The direction of a trade. The portfolio is long-only, so a sell always reduces
/// or closes an existing holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "BUY", alias = "Buy")]
    Buy,
    #[serde(alias = "SELL", alias = "Sell")]
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.pad("buy"),
            Side::Sell => f.pad("sell"),
        }
    }
}

/// One held security.
///
/// Price fields are optional because the upstream feeds do not always supply them;
/// the risk layer decides what a missing value means for each rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    /// Share count. Never negative; zero means the position is closed.
    pub quantity: Decimal,
    /// Cost basis per share, fixed at acquisition.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub avg_entry_price: Option<Decimal>,
    /// Latest observed market price.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub sector: Option<String>,
}

impl Position {
    /// A position with a zero share count is closed and ignored by risk checks.
    pub fn is_active(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Market value at the current price, if one is known and representable.
    ///
    /// Use [`Position::checked_market_value`] where an overflow has to be told
    /// apart from a missing price.
    pub fn market_value(&self) -> Option<Decimal> {
        self.checked_market_value().ok().flatten()
    }

    /// Market value at the current price; `Ok(None)` when no price is known.
    pub fn checked_market_value(&self) -> Result<Option<Decimal>> {
        let Some(price) = self.current_price else {
            return Ok(None);
        };
        price
            .checked_mul(self.quantity)
            .map(Some)
            .ok_or_else(|| Error::ValueOverflow { symbol: self.symbol.clone() })
    }

    /// Unrealized profit or loss against the cost basis.
    pub fn unrealized_pnl(&self) -> Option<Decimal> {
        let current = self.current_price?;
        let entry = self.avg_entry_price?;
        current.checked_sub(entry)?.checked_mul(self.quantity)
    }

    /// The price at or above which the position is safe from a stop-loss exit.
    pub fn stop_price(&self, stop_loss_pct: Decimal) -> Option<Decimal> {
        self.avg_entry_price
            .map(|entry| entry * (Decimal::ONE - stop_loss_pct))
    }

    /// The position's sector, falling back to the synthetic unclassified bucket.
    pub fn sector_or_default(&self) -> &str {
        match self.sector.as_deref().map(str::trim) {
            Some(sector) if !sector.is_empty() => sector,
            _ => UNCLASSIFIED_SECTOR,
        }
    }
}

/// A proposed action from the upstream decision process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub symbol: Symbol,
    pub side: Side,
    /// Desired dollar amount. `None` when the upstream value was absent or unparseable.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub target_notional: Option<Decimal>,
    /// Free text from the decision source; not used by any risk rule.
    #[serde(default)]
    pub rationale: String,
}

impl TradeIntent {
    pub fn buy(symbol: impl Into<String>, target_notional: Decimal) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            side: Side::Buy,
            target_notional: Some(target_notional),
            rationale: String::new(),
        }
    }

    pub fn sell(symbol: impl Into<String>, target_notional: Decimal) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            side: Side::Sell,
            target_notional: Some(target_notional),
            rationale: String::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }
}

/// A whole-share market order ready for the order sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    /// The price the order was sized against.
    pub reference_price: Decimal,
    /// Short human-readable note carried into logs and the trade record.
    pub note: String,
}

impl OrderRequest {
    pub fn notional(&self) -> Decimal {
        self.quantity * self.reference_price
    }
}

/// Represents the confirmed execution of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub symbol: Symbol,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fee: Decimal,
    pub executed_at: DateTime<Utc>,
    pub source_request: OrderRequest,
}
