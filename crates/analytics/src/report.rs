// In crates/analytics/src/report.rs

use crate::types::PositionRow;
use chrono::{DateTime, Utc};
use core_types::PortfolioSnapshot;
use rust_decimal::Decimal;
use serde::Serialize;

/// End-of-day view of the portfolio: one row per open position plus totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<PositionRow>,
    pub total_position_value: Decimal,
    /// P&L summed over the positions that have a cost basis.
    pub total_unrealized_pnl: Decimal,
    pub cash: Decimal,
    pub total_equity: Decimal,
}

impl PortfolioReport {
    /// Builds the report, failing like an evaluation would when cash or a price
    /// is missing.
    pub fn from_snapshot(
        snapshot: &PortfolioSnapshot,
        stop_loss_pct: Decimal,
    ) -> core_types::Result<Self> {
        let cash = snapshot.cash()?;
        let total_position_value = snapshot.positions_value()?;
        let total_equity = snapshot.equity()?;

        let rows: Vec<PositionRow> = snapshot
            .active_positions()
            .map(|p| {
                let stop_price = p.stop_price(stop_loss_pct);
                PositionRow {
                    symbol: p.symbol.clone(),
                    sector: p.sector_or_default().to_string(),
                    shares: p.quantity,
                    cost_basis: p.avg_entry_price,
                    stop_price,
                    current_price: p.current_price,
                    market_value: p.market_value(),
                    unrealized_pnl: p.unrealized_pnl(),
                    stop_breached: matches!(
                        (p.current_price, stop_price),
                        (Some(current), Some(stop)) if current < stop
                    ),
                }
            })
            .collect();

        let total_unrealized_pnl = rows
            .iter()
            .filter_map(|r| r.unrealized_pnl.map(|pnl| (&r.symbol, pnl)))
            .try_fold(Decimal::ZERO, |total, (symbol, pnl)| {
                total
                    .checked_add(pnl)
                    .ok_or_else(|| core_types::Error::ValueOverflow { symbol: symbol.clone() })
            })?;

        Ok(Self {
            generated_at: Utc::now(),
            rows,
            total_position_value,
            total_unrealized_pnl,
            cash,
            total_equity,
        })
    }
}

/// Account return against a benchmark over the same period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub starting_cash: Decimal,
    pub current_equity: Decimal,
    pub total_return: Decimal,
    pub benchmark_return: Decimal,
    /// Total return minus benchmark return.
    pub alpha: Decimal,
}

impl PerformanceSummary {
    pub fn new(starting_cash: Decimal, current_equity: Decimal, benchmark_return: Decimal) -> Self {
        let total_return = if starting_cash > Decimal::ZERO {
            (current_equity - starting_cash) / starting_cash
        } else {
            Decimal::ZERO
        };
        Self {
            starting_cash,
            current_equity,
            total_return,
            benchmark_return,
            alpha: total_return - benchmark_return,
        }
    }
}
