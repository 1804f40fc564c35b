// In crates/analytics/src/lib.rs

pub mod metrics;
pub mod report;
pub mod types;

// Re-export the most important types for easy access.
pub use metrics::{classify_regime, daily_loss_pct, period_return, regime_signals};
pub use report::{PerformanceSummary, PortfolioReport};
pub use types::{MarketRegime, PositionRow, RegimeSignals};
