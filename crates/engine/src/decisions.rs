// In crates/engine/src/decisions.rs

use core_types::{PortfolioSnapshot, Side, Symbol, TradeIntent, lenient_decimal};
use rust_decimal::Decimal;
use serde::Deserialize;

/// What the upstream decision process wants done with a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    #[serde(alias = "buy", alias = "Buy")]
    Buy,
    #[serde(alias = "sell", alias = "Sell")]
    Sell,
    #[serde(alias = "hold", alias = "Hold")]
    Hold,
}

/// One decision as the upstream research step writes it.
///
/// Numeric fields are read leniently: a value that is missing or not a number
/// becomes `None`, which the risk layer turns into a `missing_data` rejection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionRecord {
    pub action: Action,
    pub ticker: String,
    /// Fraction of total equity to trade.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub position_size: Option<Decimal>,
    /// Dollar amount to trade. Takes precedence over `position_size`.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub target_notional: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub confidence: Option<Decimal>,
    #[serde(default)]
    pub reasoning: String,
}

/// Everything a decisions file may contain.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DecisionFile {
    Intents(Vec<TradeIntent>),
    Records(Vec<DecisionRecord>),
    Wrapped { decisions: Vec<DecisionRecord> },
}

impl DecisionFile {
    /// Flattens the file into trade intents for this snapshot.
    ///
    /// Tickers come out trimmed and upper-cased whichever shape the file has.
    pub fn into_intents(self, snapshot: &PortfolioSnapshot) -> Vec<TradeIntent> {
        match self {
            DecisionFile::Intents(intents) => intents
                .into_iter()
                .map(|intent| TradeIntent {
                    symbol: Symbol::normalized(intent.symbol.as_str()),
                    ..intent
                })
                .collect(),
            DecisionFile::Records(records) | DecisionFile::Wrapped { decisions: records } => {
                intents_from_records(&records, snapshot)
            }
        }
    }
}

/// Maps upstream records to intents, dropping HOLDs.
///
/// A SELL with no size means "sell the whole holding" and is sized at the
/// holding's market value. Fractional sizes are resolved against the snapshot's
/// equity; if the snapshot cannot be valued they are left unset.
pub fn intents_from_records(
    records: &[DecisionRecord],
    snapshot: &PortfolioSnapshot,
) -> Vec<TradeIntent> {
    let equity = snapshot.equity().ok();

    records
        .iter()
        .filter_map(|record| {
            let side = match record.action {
                Action::Buy => Side::Buy,
                Action::Sell => Side::Sell,
                Action::Hold => {
                    tracing::debug!(ticker = %record.ticker, "HOLD decision dropped.");
                    return None;
                }
            };
            let symbol = Symbol::normalized(&record.ticker);

            let target_notional = match (record.target_notional, record.position_size) {
                (Some(notional), _) => Some(notional),
                (None, Some(fraction)) => equity.and_then(|equity| equity.checked_mul(fraction)),
                (None, None) if side == Side::Sell => snapshot
                    .active_position(&symbol)
                    .and_then(|position| position.market_value()),
                (None, None) => None,
            };

            Some(TradeIntent {
                symbol,
                side,
                target_notional,
                rationale: record.reasoning.clone(),
            })
        })
        .collect()
}
