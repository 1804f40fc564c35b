// In crates/risk/src/error.rs

use thiserror::Error;

/// Failures that abort a whole evaluation call.
///
/// Anything wrong with a single trade intent is reported as a rejected
/// `RiskDecision` instead; these variants cover the inputs every intent depends on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid portfolio snapshot: {0}")]
    InvalidSnapshot(#[from] core_types::Error),

    #[error("Invalid risk parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, Error>;
