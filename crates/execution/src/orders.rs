// In crates/execution/src/orders.rs

use crate::types::SimulationSettings;
use core_types::{MarketContext, OrderRequest, PortfolioSnapshot, Side};
use risk::RiskDecision;
use rust_decimal::Decimal;

/// Turns one approved decision into a whole-share market order.
///
/// Returns `None` for rejected decisions, for symbols with no usable price, and
/// when the approved notional does not buy a single share. Cash is not checked
/// here; see [`plan_orders`].
pub fn order_for_decision(
    decision: &RiskDecision,
    snapshot: &PortfolioSnapshot,
    market: &MarketContext,
) -> Option<OrderRequest> {
    if !decision.approved {
        return None;
    }
    match decision.side {
        Side::Buy => buy_order(decision, snapshot, market, None),
        Side::Sell => sell_order(decision, snapshot, market),
    }
}

/// Builds the cycle's orders: sells first, then buys sized against the cash left.
///
/// Cash is tracked the way `costs` fills the orders: sells are credited at the
/// slipped price net of fees before any buy is sized, so a stop-loss exit can fund
/// the same cycle's purchases, and each buy is charged its slipped price plus fee.
pub fn plan_orders(
    decisions: &[RiskDecision],
    snapshot: &PortfolioSnapshot,
    market: &MarketContext,
    costs: &SimulationSettings,
) -> Vec<OrderRequest> {
    let mut orders = Vec::new();
    let mut cash = snapshot.cash.unwrap_or_default();

    for decision in decisions.iter().filter(|d| d.approved && d.side == Side::Sell) {
        if let Some(order) = sell_order(decision, snapshot, market) {
            cash += costs.sell_proceeds(order.quantity, order.reference_price);
            orders.push(order);
        }
    }

    for decision in decisions.iter().filter(|d| d.approved && d.side == Side::Buy) {
        if let Some(order) = buy_order(decision, snapshot, market, Some((cash, costs))) {
            cash -= costs.buy_cost(order.quantity, order.reference_price);
            orders.push(order);
        }
    }

    orders
}

fn note(decision: &RiskDecision) -> String {
    decision
        .reason
        .map(|r| r.to_string())
        .unwrap_or_else(|| "approved".to_string())
}

fn buy_order(
    decision: &RiskDecision,
    snapshot: &PortfolioSnapshot,
    market: &MarketContext,
    funds: Option<(Decimal, &SimulationSettings)>,
) -> Option<OrderRequest> {
    let price = market
        .last_price(&decision.symbol)
        .or_else(|| snapshot.position(&decision.symbol).and_then(|p| p.current_price))
        .filter(|p| *p > Decimal::ZERO);
    let Some(price) = price else {
        tracing::warn!(symbol = %decision.symbol, "No price available; buy skipped.");
        return None;
    };

    let mut shares = (decision.adjusted_notional / price).floor();
    if let Some((cash, costs)) = funds {
        shares = shares.min(affordable_shares(cash, price, costs));
    }
    if shares <= Decimal::ZERO {
        tracing::info!(
            symbol = %decision.symbol,
            notional = %decision.adjusted_notional,
            %price,
            "Insufficient funds for even 1 share; buy skipped."
        );
        return None;
    }

    Some(OrderRequest {
        symbol: decision.symbol.clone(),
        side: Side::Buy,
        quantity: shares,
        reference_price: price,
        note: note(decision),
    })
}

/// Whole shares whose fill, fee included, `cash` covers.
fn affordable_shares(cash: Decimal, price: Decimal, costs: &SimulationSettings) -> Decimal {
    let per_share = costs.buy_cost(Decimal::ONE, price);
    if cash <= Decimal::ZERO || per_share <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let shares = (cash / per_share).floor();
    // The quotient is rounded, so it can land one share past what is affordable.
    if shares > Decimal::ZERO && costs.buy_cost(shares, price) > cash {
        shares - Decimal::ONE
    } else {
        shares
    }
}

fn sell_order(
    decision: &RiskDecision,
    snapshot: &PortfolioSnapshot,
    market: &MarketContext,
) -> Option<OrderRequest> {
    let Some(position) = snapshot.active_position(&decision.symbol) else {
        tracing::warn!(symbol = %decision.symbol, "No position to sell; sell skipped.");
        return None;
    };
    let Some(price) = position
        .current_price
        .or_else(|| market.last_price(&decision.symbol))
        .filter(|p| *p > Decimal::ZERO)
    else {
        tracing::warn!(symbol = %decision.symbol, "No price available; sell skipped.");
        return None;
    };

    let quantity = match decision.liquidate_quantity {
        Some(quantity) => quantity.min(position.quantity),
        None if decision.adjusted_notional >= position.quantity.saturating_mul(price) => {
            position.quantity
        }
        None => (decision.adjusted_notional / price).floor().min(position.quantity),
    };
    if quantity <= Decimal::ZERO {
        tracing::info!(
            symbol = %decision.symbol,
            notional = %decision.adjusted_notional,
            "Approved notional is below one share; sell skipped."
        );
        return None;
    }

    Some(OrderRequest {
        symbol: decision.symbol.clone(),
        side: Side::Sell,
        quantity,
        reference_price: price,
        note: note(decision),
    })
}
