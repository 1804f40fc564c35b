// In crates/engine/src/sources.rs

use crate::decisions::DecisionFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_types::{MarketContext, PortfolioSnapshot, TradeIntent};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Supplies the broker's view of cash and holdings.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn load_snapshot(&self) -> Result<PortfolioSnapshot>;
}

/// Supplies the trade intents proposed for this cycle.
///
/// The snapshot is passed in so that sources which size trades as a fraction of
/// equity can resolve them to dollars.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn load_intents(&self, snapshot: &PortfolioSnapshot) -> Result<Vec<TradeIntent>>;
}

/// Supplies the regime flag, the day's loss and per-symbol quotes.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn load_market(&self) -> Result<MarketContext>;
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Reads a `PortfolioSnapshot` from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonPositionSource {
    path: PathBuf,
}

impl JsonPositionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PositionSource for JsonPositionSource {
    async fn load_snapshot(&self) -> Result<PortfolioSnapshot> {
        read_json(&self.path).await
    }
}

/// Reads intents, or upstream decision records, from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonDecisionSource {
    path: PathBuf,
}

impl JsonDecisionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DecisionSource for JsonDecisionSource {
    async fn load_intents(&self, snapshot: &PortfolioSnapshot) -> Result<Vec<TradeIntent>> {
        let file: DecisionFile = read_json(&self.path).await?;
        Ok(file.into_intents(snapshot))
    }
}

/// Reads a `MarketContext` from a JSON file. A missing file means a quiet market
/// with no quotes, so every buy is rejected for missing liquidity data.
#[derive(Debug, Clone)]
pub struct JsonMarketSource {
    path: PathBuf,
}

impl JsonMarketSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MarketDataSource for JsonMarketSource {
    async fn load_market(&self) -> Result<MarketContext> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            tracing::warn!(path = %self.path.display(), "Market data file not found; using an empty context.");
            return Ok(MarketContext::default());
        }
        read_json(&self.path).await
    }
}

/// Fixed inputs held in memory, for tests and one-off evaluations.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub snapshot: Option<PortfolioSnapshot>,
    pub intents: Vec<TradeIntent>,
    pub market: MarketContext,
}

#[async_trait]
impl PositionSource for StaticSource {
    async fn load_snapshot(&self) -> Result<PortfolioSnapshot> {
        self.snapshot.clone().context("No snapshot configured")
    }
}

#[async_trait]
impl DecisionSource for StaticSource {
    async fn load_intents(&self, _snapshot: &PortfolioSnapshot) -> Result<Vec<TradeIntent>> {
        Ok(self.intents.clone())
    }
}

#[async_trait]
impl MarketDataSource for StaticSource {
    async fn load_market(&self) -> Result<MarketContext> {
        Ok(self.market.clone())
    }
}
