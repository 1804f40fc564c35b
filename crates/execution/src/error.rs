// In crates/execution/src/error.rs

use core_types::Symbol;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Insufficient cash for {symbol}: need {required}, have {available}")]
    InsufficientCash {
        symbol: Symbol,
        required: Decimal,
        available: Decimal,
    },

    #[error("Cannot sell {requested} shares of {symbol}: only {held} held")]
    InsufficientShares {
        symbol: Symbol,
        requested: Decimal,
        held: Decimal,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
