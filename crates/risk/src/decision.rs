// In crates/risk/src/decision.rs

use core_types::{Position, Side, Symbol, TradeIntent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an intent was not approved exactly as requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Sell requested on a symbol with no active holding.
    NotHeld,
    /// Requested notional is zero or negative.
    InvalidSize,
    /// A number the rules need (notional, cost basis, dollar volume) is absent.
    MissingData,
    /// The daily loss limit has tripped; buying is halted for the cycle.
    CircuitBreaker,
    /// Average dollar volume is below the configured minimum.
    LiquidityFilter,
    /// The symbol is already at or above its position cap.
    PositionCapExceeded,
    /// Approved, but trimmed to fit the position cap.
    PositionCapReduced,
    /// The symbol's sector is already at or above its cap.
    SectorCapExceeded,
    /// Approved, but trimmed to fit the sector cap.
    SectorCapReduced,
    /// The held position breached its stop-loss; the intent became a full liquidation.
    StopLoss,
    /// An earlier intent in the same batch already liquidates this symbol.
    StopLossPending,
    /// Approved sell trimmed to the value actually held.
    HoldingLimited,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::NotHeld => "not_held",
            DecisionReason::InvalidSize => "invalid_size",
            DecisionReason::MissingData => "missing_data",
            DecisionReason::CircuitBreaker => "circuit_breaker",
            DecisionReason::LiquidityFilter => "liquidity_filter",
            DecisionReason::PositionCapExceeded => "position_cap_exceeded",
            DecisionReason::PositionCapReduced => "position_cap_reduced",
            DecisionReason::SectorCapExceeded => "sector_cap_exceeded",
            DecisionReason::SectorCapReduced => "sector_cap_reduced",
            DecisionReason::StopLoss => "stop_loss",
            DecisionReason::StopLossPending => "stop_loss_pending",
            DecisionReason::HoldingLimited => "holding_limited",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evaluator's verdict on one trade intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDecision {
    pub symbol: Symbol,
    /// The side to trade. Differs from the intent only for stop-loss overrides.
    pub side: Side,
    pub approved: bool,
    /// The intent's notional as received, `None` for sweep-generated liquidations.
    pub requested_notional: Option<Decimal>,
    /// Dollar amount permitted; zero when rejected.
    pub adjusted_notional: Decimal,
    pub reason: Option<DecisionReason>,
    /// Share count to sell for a forced liquidation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidate_quantity: Option<Decimal>,
}

impl RiskDecision {
    pub(crate) fn approve(
        intent: &TradeIntent,
        notional: Decimal,
        reason: Option<DecisionReason>,
    ) -> Self {
        Self {
            symbol: intent.symbol.clone(),
            side: intent.side,
            approved: true,
            requested_notional: intent.target_notional,
            adjusted_notional: notional,
            reason,
            liquidate_quantity: None,
        }
    }

    pub(crate) fn reject(intent: &TradeIntent, reason: DecisionReason) -> Self {
        Self {
            symbol: intent.symbol.clone(),
            side: intent.side,
            approved: false,
            requested_notional: intent.target_notional,
            adjusted_notional: Decimal::ZERO,
            reason: Some(reason),
            liquidate_quantity: None,
        }
    }

    /// A full-liquidation sell of `position`, replacing whatever was requested.
    pub(crate) fn liquidate(position: &Position, requested_notional: Option<Decimal>) -> Self {
        Self {
            symbol: position.symbol.clone(),
            side: Side::Sell,
            approved: true,
            requested_notional,
            adjusted_notional: position.market_value().unwrap_or_default(),
            reason: Some(DecisionReason::StopLoss),
            liquidate_quantity: Some(position.quantity),
        }
    }

    pub fn is_forced_liquidation(&self) -> bool {
        self.reason == Some(DecisionReason::StopLoss)
    }

    /// Approved for less than was asked.
    pub fn is_reduced(&self) -> bool {
        self.approved
            && !self.is_forced_liquidation()
            && self
                .requested_notional
                .is_some_and(|requested| self.adjusted_notional < requested)
    }
}
