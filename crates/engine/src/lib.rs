// In crates/engine/src/lib.rs

pub mod cycle;
pub mod decisions;
pub mod sources;

pub use cycle::{CycleReport, DailyCycle, OrderFailure};
pub use decisions::{Action, DecisionFile, DecisionRecord, intents_from_records};
pub use sources::{
    DecisionSource, JsonDecisionSource, JsonMarketSource, JsonPositionSource, MarketDataSource,
    PositionSource, StaticSource,
};
