// In crates/core-types/src/snapshot.rs

use crate::lenient::lenient_decimal;
use crate::{Error, Position, Result, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The aggregate portfolio state passed into one evaluation cycle.
///
/// Positions are keyed by symbol, so a snapshot can never hold two entries for the
/// same ticker. Equity is derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecord", into = "SnapshotRecord")]
pub struct PortfolioSnapshot {
    /// Available uninvested capital. `None` when the source did not report it.
    pub cash: Option<Decimal>,
    positions: BTreeMap<Symbol, Position>,
}

/// The on-disk shape of a snapshot: positions as a plain list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotRecord {
    #[serde(default, deserialize_with = "lenient_decimal")]
    cash: Option<Decimal>,
    #[serde(default)]
    positions: Vec<Position>,
}

impl TryFrom<SnapshotRecord> for PortfolioSnapshot {
    type Error = Error;

    fn try_from(record: SnapshotRecord) -> Result<Self> {
        Self::new(record.cash, record.positions)
    }
}

impl From<PortfolioSnapshot> for SnapshotRecord {
    fn from(snapshot: PortfolioSnapshot) -> Self {
        Self {
            cash: snapshot.cash,
            positions: snapshot.positions.into_values().collect(),
        }
    }
}

impl PortfolioSnapshot {
    /// Builds a snapshot, rejecting duplicate symbols and negative quantities.
    pub fn new(cash: Option<Decimal>, positions: Vec<Position>) -> Result<Self> {
        let mut by_symbol = BTreeMap::new();
        for position in positions {
            if position.quantity < Decimal::ZERO {
                return Err(Error::NegativeQuantity { symbol: position.symbol });
            }
            if by_symbol.contains_key(&position.symbol) {
                return Err(Error::DuplicateSymbol { symbol: position.symbol });
            }
            by_symbol.insert(position.symbol.clone(), position);
        }
        Ok(Self { cash, positions: by_symbol })
    }

    /// A snapshot holding only cash.
    pub fn with_cash(cash: Decimal) -> Self {
        Self { cash: Some(cash), positions: BTreeMap::new() }
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// The position for `symbol` if it is held with a positive quantity.
    pub fn active_position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol).filter(|p| p.is_active())
    }

    /// Every position, including closed ones, in symbol order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Positions with a positive quantity, in symbol order.
    pub fn active_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(|p| p.is_active())
    }

    pub fn cash(&self) -> Result<Decimal> {
        self.cash.ok_or(Error::MissingCash)
    }

    /// Sum of market values over active positions.
    ///
    /// Fails if any active position has no current price, since the total would
    /// silently understate exposure.
    pub fn positions_value(&self) -> Result<Decimal> {
        self.active_positions().try_fold(Decimal::ZERO, |total, p| {
            let value = p
                .checked_market_value()?
                .ok_or_else(|| Error::MissingPrice { symbol: p.symbol.clone() })?;
            total
                .checked_add(value)
                .ok_or_else(|| Error::ValueOverflow { symbol: p.symbol.clone() })
        })
    }

    /// Cash plus the market value of all active positions.
    pub fn equity(&self) -> Result<Decimal> {
        self.cash()?
            .checked_add(self.positions_value()?)
            .ok_or(Error::EquityOverflow)
    }

    /// Checks everything an evaluation needs from the snapshot as a whole.
    pub fn validate(&self) -> Result<()> {
        self.equity().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn held(symbol: &str, quantity: Decimal, price: Option<Decimal>) -> Position {
        Position {
            symbol: Symbol::from(symbol),
            quantity,
            avg_entry_price: Some(dec!(1)),
            current_price: price,
            sector: None,
        }
    }

    #[test]
    fn equity_is_cash_plus_active_positions() {
        let snapshot = PortfolioSnapshot::new(
            Some(dec!(8600)),
            vec![
                held("X", dec!(10), Some(dec!(140))),
                // Closed positions never contribute, even without a price.
                held("Z", dec!(0), None),
            ],
        )
        .unwrap();
        assert_eq!(snapshot.equity().unwrap(), dec!(10000));
        assert!(snapshot.active_position(&Symbol::from("Z")).is_none());
        assert!(snapshot.position(&Symbol::from("Z")).is_some());
    }

    #[test]
    fn missing_cash_is_fatal() {
        let snapshot = PortfolioSnapshot::new(None, vec![]).unwrap();
        assert_eq!(snapshot.validate(), Err(Error::MissingCash));
    }

    #[test]
    fn missing_price_on_active_position_is_fatal() {
        let snapshot =
            PortfolioSnapshot::new(Some(dec!(100)), vec![held("X", dec!(5), None)]).unwrap();
        assert_eq!(
            snapshot.validate(),
            Err(Error::MissingPrice { symbol: Symbol::from("X") })
        );
    }

    #[test]
    fn unrepresentable_equity_is_an_error() {
        let huge = PortfolioSnapshot::new(
            Some(dec!(100)),
            vec![held("X", Decimal::MAX, Some(dec!(10)))],
        )
        .unwrap();
        assert_eq!(huge.equity(), Err(Error::ValueOverflow { symbol: Symbol::from("X") }));

        // Each value fits on its own, but not the total.
        let wide = PortfolioSnapshot::new(
            Some(dec!(100)),
            vec![
                held("X", Decimal::MAX, Some(dec!(1))),
                held("Y", Decimal::MAX, Some(dec!(1))),
            ],
        )
        .unwrap();
        assert_eq!(wide.equity(), Err(Error::ValueOverflow { symbol: Symbol::from("Y") }));

        let rich = PortfolioSnapshot::new(Some(Decimal::MAX), vec![held("X", dec!(1), Some(dec!(1)))])
            .unwrap();
        assert_eq!(rich.validate(), Err(Error::EquityOverflow));
    }

    #[test]
    fn rejects_duplicates_and_negative_quantities() {
        let dup = PortfolioSnapshot::new(
            Some(dec!(1)),
            vec![held("X", dec!(1), Some(dec!(1))), held("X", dec!(2), Some(dec!(1)))],
        );
        assert_eq!(dup, Err(Error::DuplicateSymbol { symbol: Symbol::from("X") }));

        let negative =
            PortfolioSnapshot::new(Some(dec!(1)), vec![held("Y", dec!(-1), Some(dec!(1)))]);
        assert_eq!(negative, Err(Error::NegativeQuantity { symbol: Symbol::from("Y") }));
    }

    #[test]
    fn deserializes_from_position_list() {
        let json = r#"{
            "cash": "8600",
            "positions": [
                {"symbol": "X", "quantity": 10, "avg_entry_price": "100", "current_price": 140, "sector": "Technology"}
            ]
        }"#;
        let snapshot: PortfolioSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.equity().unwrap(), dec!(10000));

        let duplicated = r#"{"cash": 1, "positions": [
            {"symbol": "X", "quantity": 1, "current_price": 1},
            {"symbol": "X", "quantity": 1, "current_price": 1}
        ]}"#;
        assert!(serde_json::from_str::<PortfolioSnapshot>(duplicated).is_err());
    }
}
