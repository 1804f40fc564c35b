// In crates/risk/src/lib.rs

use core_types::{MarketContext, PortfolioSnapshot, TradeIntent};

pub mod decision;
pub mod error;
pub mod portfolio_evaluator;
pub mod types;

// Re-export public types
pub use decision::{DecisionReason, RiskDecision};
pub use error::{Error, Result};
pub use portfolio_evaluator::{PortfolioRiskEvaluator, evaluate, is_stop_loss_breached, stop_loss_sweep};
pub use types::RiskConfig;

/// The universal interface for a portfolio risk module.
///
/// A `RiskEvaluator` takes the current portfolio, the intents proposed for this
/// cycle and the externally computed market context, and decides how much of each
/// intent may be traded. Implementations must be pure: the same inputs always give
/// the same decisions, and nothing is remembered between calls.
pub trait RiskEvaluator: Send + Sync {
    /// The name of the risk evaluator.
    fn name(&self) -> &'static str;

    /// Evaluates a batch of trade intents.
    ///
    /// # Returns
    ///
    /// * `Ok(decisions)`: one `RiskDecision` per intent, in input order. Intents that
    ///   break a rule are rejected decisions, not errors.
    /// * `Err(Error::InvalidSnapshot)`: the snapshot cannot be valued (e.g. no cash).
    /// * `Err(Error::InvalidParameters)`: the configured limits are unusable.
    fn evaluate(
        &self,
        snapshot: &PortfolioSnapshot,
        intents: &[TradeIntent],
        market: &MarketContext,
    ) -> Result<Vec<RiskDecision>>;

    /// Forced liquidations for breached holdings that none of `intents` mention.
    fn stop_loss_sweep(
        &self,
        snapshot: &PortfolioSnapshot,
        intents: &[TradeIntent],
    ) -> Vec<RiskDecision>;
}
