// In crates/execution/src/types.rs

use core_types::{PortfolioSnapshot, Side, Symbol};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Fill model for the paper executor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// The fee charged on every fill, as a fraction of its value (e.g., 0.0004 for 0.04%).
    pub taker_fee: Decimal,

    /// The simulated slippage for market orders (e.g., 0.0005 for 0.05%).
    pub slippage_percent: Decimal,
}

impl SimulationSettings {
    /// The price an order at `reference_price` fills at.
    pub fn fill_price(&self, side: Side, reference_price: Decimal) -> Decimal {
        match side {
            // Slippage always makes the price worse: higher to buy, lower to sell.
            Side::Buy => reference_price * (Decimal::ONE + self.slippage_percent),
            Side::Sell => reference_price * (Decimal::ONE - self.slippage_percent),
        }
    }

    /// The fee on a fill of the given value.
    pub fn fee(&self, value: Decimal) -> Decimal {
        value * self.taker_fee
    }

    /// Cash a buy takes out of the account, fee included.
    pub fn buy_cost(&self, quantity: Decimal, reference_price: Decimal) -> Decimal {
        let value = quantity * self.fill_price(Side::Buy, reference_price);
        value + self.fee(value)
    }

    /// Cash a sell puts back into the account, net of the fee.
    pub fn sell_proceeds(&self, quantity: Decimal, reference_price: Decimal) -> Decimal {
        let value = quantity * self.fill_price(Side::Sell, reference_price);
        value - self.fee(value)
    }
}

/// Shares held in the paper account.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
}

/// Represents the state of the paper trading account.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    /// The uninvested cash balance.
    pub cash: Decimal,

    /// A map holding the currently open holdings, keyed by symbol.
    pub holdings: HashMap<Symbol, Holding>,
}

impl Portfolio {
    /// Creates a new portfolio with an initial cash balance.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            holdings: HashMap::new(),
        }
    }

    /// Seeds a paper account from a broker snapshot.
    ///
    /// Missing cash counts as zero and positions without a cost basis use their
    /// current price, so the paper account can always be built.
    pub fn from_snapshot(snapshot: &PortfolioSnapshot) -> Self {
        let holdings = snapshot
            .active_positions()
            .map(|p| {
                let entry = p.avg_entry_price.or(p.current_price).unwrap_or_default();
                (
                    p.symbol.clone(),
                    Holding { quantity: p.quantity, avg_entry_price: entry },
                )
            })
            .collect();
        Self {
            cash: snapshot.cash.unwrap_or_default(),
            holdings,
        }
    }

    pub fn shares(&self, symbol: &Symbol) -> Decimal {
        self.holdings.get(symbol).map(|h| h.quantity).unwrap_or_default()
    }
}
