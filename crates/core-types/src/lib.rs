// In crates/core-types/src/lib.rs

pub mod error;
pub mod lenient;
pub mod market;
pub mod snapshot;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use lenient::lenient_decimal;
pub use market::{MarketContext, MarketQuote};
pub use snapshot::PortfolioSnapshot;
pub use types::{
    Execution, OrderRequest, Position, Side, Symbol, TradeIntent, UNCLASSIFIED_SECTOR,
};
