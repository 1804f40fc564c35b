// In crates/core-types/src/error.rs

use thiserror::Error;

use crate::Symbol;

/// Structural problems with a portfolio snapshot.
///
/// These are the only conditions that make a whole evaluation call fail; problems
/// with individual trade intents are reported as decisions instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Portfolio snapshot has no cash balance")]
    MissingCash,

    #[error("Position {symbol} has no current price")]
    MissingPrice { symbol: Symbol },

    #[error("Position {symbol} has a negative quantity")]
    NegativeQuantity { symbol: Symbol },

    #[error("Symbol {symbol} appears more than once in the snapshot")]
    DuplicateSymbol { symbol: Symbol },

    #[error("Portfolio value overflows at {symbol}")]
    ValueOverflow { symbol: Symbol },

    #[error("Portfolio equity is too large to represent")]
    EquityOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
