// In crates/app-config/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration")]
    LoadError(#[from] config::ConfigError),

    #[error("Configured risk limits are invalid: {0}")]
    InvalidRisk(#[from] risk::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
