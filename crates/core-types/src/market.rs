// In crates/core-types/src/market.rs

use crate::lenient::lenient_decimal;
use crate::{Symbol, UNCLASSIFIED_SECTOR};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Externally fetched market figures for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Average daily dollar volume (shares traded × price), used by the liquidity filter.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub avg_dollar_volume: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub last_price: Option<Decimal>,
    /// Sector classification for symbols that are not yet held.
    #[serde(default)]
    pub sector: Option<String>,
}

/// Market-wide inputs computed outside the risk evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Set when the market is in a detected bear regime; tightens position caps.
    #[serde(default)]
    pub bear_regime: bool,
    /// Today's realized plus unrealized loss as a positive fraction of start-of-day
    /// equity. Zero on a flat or winning day.
    #[serde(default)]
    pub daily_loss_pct: Decimal,
    #[serde(default)]
    pub quotes: HashMap<Symbol, MarketQuote>,
}

impl MarketContext {
    pub fn quote(&self, symbol: &Symbol) -> Option<&MarketQuote> {
        self.quotes.get(symbol)
    }

    pub fn with_quote(mut self, symbol: impl Into<String>, quote: MarketQuote) -> Self {
        self.quotes.insert(Symbol::new(symbol), quote);
        self
    }

    pub fn dollar_volume(&self, symbol: &Symbol) -> Option<Decimal> {
        self.quote(symbol).and_then(|q| q.avg_dollar_volume)
    }

    pub fn last_price(&self, symbol: &Symbol) -> Option<Decimal> {
        self.quote(symbol).and_then(|q| q.last_price)
    }

    /// The quoted sector for `symbol`, or the unclassified bucket.
    pub fn sector(&self, symbol: &Symbol) -> &str {
        match self
            .quote(symbol)
            .and_then(|q| q.sector.as_deref())
            .map(str::trim)
        {
            Some(sector) if !sector.is_empty() => sector,
            _ => UNCLASSIFIED_SECTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deserializes_with_symbol_keys() {
        let json = r#"{
            "bear_regime": true,
            "daily_loss_pct": "0.06",
            "quotes": {"RGTI": {"avg_dollar_volume": 450000, "last_price": "12.5", "sector": "Technology"}}
        }"#;
        let market: MarketContext = serde_json::from_str(json).unwrap();
        let rgti = Symbol::from("RGTI");
        assert!(market.bear_regime);
        assert_eq!(market.daily_loss_pct, dec!(0.06));
        assert_eq!(market.dollar_volume(&rgti), Some(dec!(450000)));
        assert_eq!(market.sector(&rgti), "Technology");
        assert_eq!(market.sector(&Symbol::from("NOPE")), UNCLASSIFIED_SECTOR);
    }

    #[test]
    fn unreadable_volume_is_treated_as_unknown() {
        let json = r#"{"quotes": {"MVIS": {"avg_dollar_volume": "n/a", "last_price": 7}}}"#;
        let market: MarketContext = serde_json::from_str(json).unwrap();
        let mvis = Symbol::from("MVIS");
        assert_eq!(market.dollar_volume(&mvis), None);
        assert_eq!(market.last_price(&mvis), Some(dec!(7)));
    }
}
