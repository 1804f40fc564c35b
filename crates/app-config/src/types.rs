// In crates/app-config/src/types.rs

use serde::Deserialize;
use std::path::PathBuf;

use execution::types::SimulationSettings;
use risk::RiskConfig;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    #[serde(default)]
    pub app: AppSettings,
    /// Limits for the portfolio risk evaluator. Any field left out keeps its default.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Fill model for the paper executor.
    #[serde(default)]
    pub paper: SimulationSettings,
    /// Where the file-backed sources read their inputs.
    #[serde(default)]
    pub data: DataSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,
    /// The log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
        }
    }
}

/// Input files for one daily cycle.
#[derive(Deserialize, Debug, Clone)]
pub struct DataSettings {
    /// Cash and holdings, as reported by the broker.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Upstream decisions or plain trade intents.
    #[serde(default = "default_intents_path")]
    pub intents_path: PathBuf,
    /// Regime flag, daily loss and per-symbol quotes.
    #[serde(default = "default_market_path")]
    pub market_path: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            intents_path: default_intents_path(),
            market_path: default_market_path(),
        }
    }
}

/// Helper functions for serde defaults
fn default_environment() -> String { "development".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_snapshot_path() -> PathBuf { PathBuf::from("data/snapshot.json") }
fn default_intents_path() -> PathBuf { PathBuf::from("data/intents.json") }
fn default_market_path() -> PathBuf { PathBuf::from("data/market.json") }
