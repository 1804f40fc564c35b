// In crates/execution/src/paper.rs

use crate::types::{Holding, Portfolio, SimulationSettings};
use crate::{Error, Executor, Result};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Execution, OrderRequest, PortfolioSnapshot, Side};
use rust_decimal::Decimal;

/// Fills orders against an in-memory account at the order's reference price.
pub struct PaperExecutor {
    settings: SimulationSettings,
    portfolio: Portfolio,
}

impl PaperExecutor {
    pub fn new(settings: SimulationSettings, portfolio: Portfolio) -> Self {
        Self { settings, portfolio }
    }

    pub fn from_snapshot(settings: SimulationSettings, snapshot: &PortfolioSnapshot) -> Self {
        Self::new(settings, Portfolio::from_snapshot(snapshot))
    }

    fn process_buy(&mut self, order: &OrderRequest) -> Result<Execution> {
        // --- 1. Calculate Execution Price and Costs ---
        let price = self.settings.fill_price(order.side, order.reference_price);
        let value = order.quantity * price;
        let fee = self.settings.fee(value);
        let required = value + fee;

        // --- 2. Check Funds ---
        if self.portfolio.cash < required {
            return Err(Error::InsufficientCash {
                symbol: order.symbol.clone(),
                required,
                available: self.portfolio.cash,
            });
        }

        // --- 3. Update Portfolio State ---
        self.portfolio.cash -= required;
        let holding = self
            .portfolio
            .holdings
            .entry(order.symbol.clone())
            .or_insert(Holding { quantity: Decimal::ZERO, avg_entry_price: Decimal::ZERO });
        let total_quantity = holding.quantity + order.quantity;
        holding.avg_entry_price =
            (holding.quantity * holding.avg_entry_price + value) / total_quantity;
        holding.quantity = total_quantity;

        Ok(self.execution(order, price, fee))
    }

    fn process_sell(&mut self, order: &OrderRequest) -> Result<Execution> {
        // --- 1. Find the Holding ---
        let held = self.portfolio.shares(&order.symbol);
        if held < order.quantity {
            return Err(Error::InsufficientShares {
                symbol: order.symbol.clone(),
                requested: order.quantity,
                held,
            });
        }

        // --- 2. Calculate Execution Price and Costs ---
        let price = self.settings.fill_price(order.side, order.reference_price);
        let value = order.quantity * price;
        let fee = self.settings.fee(value);

        // --- 3. Update Portfolio State ---
        self.portfolio.cash += value - fee;
        if held == order.quantity {
            self.portfolio.holdings.remove(&order.symbol);
        } else if let Some(holding) = self.portfolio.holdings.get_mut(&order.symbol) {
            holding.quantity -= order.quantity;
        }

        Ok(self.execution(order, price, fee))
    }

    fn execution(&self, order: &OrderRequest, price: Decimal, fee: Decimal) -> Execution {
        Execution {
            symbol: order.symbol.clone(),
            side: order.side,
            price,
            quantity: order.quantity,
            fee,
            executed_at: Utc::now(),
            source_request: order.clone(),
        }
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    fn name(&self) -> &'static str {
        "PaperExecutor"
    }

    fn cost_model(&self) -> SimulationSettings {
        self.settings.clone()
    }

    async fn execute(&mut self, order: &OrderRequest) -> Result<Execution> {
        if order.quantity <= Decimal::ZERO || order.reference_price <= Decimal::ZERO {
            return Err(Error::ExecutionFailed {
                reason: format!(
                    "Order for {} needs a positive quantity and price, got {} @ {}",
                    order.symbol, order.quantity, order.reference_price
                ),
            });
        }

        let result = match order.side {
            Side::Buy => self.process_buy(order),
            Side::Sell => self.process_sell(order),
        };

        match &result {
            Ok(execution) => tracing::info!(
                symbol = %execution.symbol,
                side = %execution.side,
                quantity = %execution.quantity,
                price = %execution.price,
                fee = %execution.fee,
                cash = %self.portfolio.cash,
                "Paper order filled."
            ),
            Err(e) => tracing::warn!(symbol = %order.symbol, error = %e, "Paper order failed."),
        }
        result
    }

    fn portfolio(&self) -> Option<&Portfolio> {
        Some(&self.portfolio)
    }
}
