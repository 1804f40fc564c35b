// In crates/risk/src/types.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Limits applied by the portfolio risk evaluator.
///
/// Every field has a default, so a config section only needs to name the limits it
/// changes. Fractions are of current portfolio equity unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Largest post-trade market value of a single symbol.
    pub max_position_pct: Decimal,
    /// Largest post-trade aggregate market value of one sector.
    pub sector_max_pct: Decimal,
    /// Drop below the average entry price that forces a full liquidation.
    pub stop_loss_pct: Decimal,
    /// Minimum average daily dollar volume for a symbol to be bought.
    pub min_dollar_volume: Decimal,
    /// Replaces `max_position_pct` while the market is in a bear regime.
    pub bear_max_position_pct: Decimal,
    /// Daily loss fraction above which all buying stops for the cycle.
    pub daily_loss_circuit_breaker_pct: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_pct: dec!(0.15),
            sector_max_pct: dec!(0.40),
            stop_loss_pct: dec!(0.15),
            min_dollar_volume: dec!(300000),
            bear_max_position_pct: dec!(0.07),
            daily_loss_circuit_breaker_pct: dec!(0.05),
        }
    }
}

impl RiskConfig {
    /// The per-symbol cap fraction for the given market regime.
    pub fn position_cap_pct(&self, bear_regime: bool) -> Decimal {
        if bear_regime {
            self.bear_max_position_pct
        } else {
            self.max_position_pct
        }
    }

    /// Rejects fractions outside (0, 1] and a negative volume floor.
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("max_position_pct", self.max_position_pct),
            ("sector_max_pct", self.sector_max_pct),
            ("stop_loss_pct", self.stop_loss_pct),
            ("bear_max_position_pct", self.bear_max_position_pct),
            ("daily_loss_circuit_breaker_pct", self.daily_loss_circuit_breaker_pct),
        ];
        for (name, value) in fractions {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(Error::InvalidParameters(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.min_dollar_volume < Decimal::ZERO {
            return Err(Error::InvalidParameters(format!(
                "min_dollar_volume must not be negative, got {}",
                self.min_dollar_volume
            )));
        }
        Ok(())
    }
}
