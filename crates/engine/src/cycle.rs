// In crates/engine/src/cycle.rs

use crate::sources::{DecisionSource, MarketDataSource, PositionSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use core_types::{Execution, OrderRequest};
use execution::{Executor, plan_orders};
use risk::{RiskDecision, RiskEvaluator};
use serde::Serialize;

/// An order the executor refused or failed to fill.
#[derive(Debug, Clone, Serialize)]
pub struct OrderFailure {
    pub order: OrderRequest,
    pub error: String,
}

/// Everything one daily cycle decided and did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Sweep liquidations first, then one decision per intent in input order.
    pub decisions: Vec<RiskDecision>,
    pub orders: Vec<OrderRequest>,
    pub executions: Vec<Execution>,
    pub failures: Vec<OrderFailure>,
}

impl CycleReport {
    pub fn approved(&self) -> usize {
        self.decisions.iter().filter(|d| d.approved).count()
    }
}

/// One pass of the daily trading routine: load, check risk, place orders.
pub struct DailyCycle {
    positions: Box<dyn PositionSource>,
    decisions: Box<dyn DecisionSource>,
    market: Box<dyn MarketDataSource>,
    evaluator: Box<dyn RiskEvaluator>,
    executor: Box<dyn Executor + Send + Sync>,
}

impl DailyCycle {
    pub fn new(
        positions: Box<dyn PositionSource>,
        decisions: Box<dyn DecisionSource>,
        market: Box<dyn MarketDataSource>,
        evaluator: Box<dyn RiskEvaluator>,
        executor: Box<dyn Executor + Send + Sync>,
    ) -> Self {
        Self {
            positions,
            decisions,
            market,
            evaluator,
            executor,
        }
    }

    pub fn executor(&self) -> &(dyn Executor + Send + Sync) {
        self.executor.as_ref()
    }

    /// Runs the cycle once.
    ///
    /// Failing to load inputs, or an unusable snapshot, aborts the cycle before any
    /// order is placed. Individual order failures are recorded in the report and
    /// never stop the remaining orders.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        let started_at = Utc::now();
        tracing::info!(
            evaluator = self.evaluator.name(),
            executor = self.executor.name(),
            "Starting daily cycle."
        );

        // --- 1. Load Inputs ---
        let snapshot = self
            .positions
            .load_snapshot()
            .await
            .context("Failed to load the portfolio snapshot")?;
        let market = self
            .market
            .load_market()
            .await
            .context("Failed to load market data")?;
        let intents = self
            .decisions
            .load_intents(&snapshot)
            .await
            .context("Failed to load trade intents")?;
        tracing::info!(
            positions = snapshot.active_positions().count(),
            intents = intents.len(),
            bear_regime = market.bear_regime,
            daily_loss_pct = %market.daily_loss_pct,
            "Cycle inputs loaded."
        );

        // --- 2. Risk: stop losses first, then the proposed intents ---
        let mut decisions = self.evaluator.stop_loss_sweep(&snapshot, &intents);
        let evaluated = self
            .evaluator
            .evaluate(&snapshot, &intents, &market)
            .context("Risk evaluation failed")?;
        decisions.extend(evaluated);

        // --- 3. Orders ---
        let costs = self.executor.cost_model();
        let orders = plan_orders(&decisions, &snapshot, &market, &costs);

        // --- 4. Submit ---
        let mut executions = Vec::new();
        let mut failures = Vec::new();
        for order in &orders {
            match self.executor.execute(order).await {
                Ok(execution) => executions.push(execution),
                Err(e) => {
                    tracing::error!(symbol = %order.symbol, side = %order.side, error = %e, "Order failed.");
                    failures.push(OrderFailure { order: order.clone(), error: e.to_string() });
                }
            }
        }

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            decisions,
            orders,
            executions,
            failures,
        };
        tracing::info!(
            decisions = report.decisions.len(),
            approved = report.approved(),
            executed = report.executions.len(),
            failed = report.failures.len(),
            "Daily cycle complete."
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticSource;
    use async_trait::async_trait;
    use core_types::{
        MarketContext, MarketQuote, PortfolioSnapshot, Position, Side, Symbol, TradeIntent,
    };
    use execution::{PaperExecutor, SimulationSettings};
    use risk::{DecisionReason, PortfolioRiskEvaluator, RiskConfig};
    use rust_decimal_macros::dec;

    fn snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot::new(
            Some(dec!(8560)),
            vec![
                Position {
                    symbol: Symbol::from("X"),
                    quantity: dec!(10),
                    avg_entry_price: Some(dec!(100)),
                    current_price: Some(dec!(60)),
                    sector: Some("Technology".to_string()),
                },
                Position {
                    symbol: Symbol::from("Y"),
                    quantity: dec!(100),
                    avg_entry_price: Some(dec!(10)),
                    current_price: Some(dec!(8.40)),
                    sector: Some("Healthcare".to_string()),
                },
            ],
        )
        .unwrap()
    }

    fn market(daily_loss_pct: rust_decimal::Decimal) -> MarketContext {
        MarketContext {
            daily_loss_pct,
            ..MarketContext::default()
        }
        .with_quote(
            "Z",
            MarketQuote {
                avg_dollar_volume: Some(dec!(5000000)),
                last_price: Some(dec!(20)),
                sector: Some("Energy".to_string()),
            },
        )
    }

    fn cycle(source: StaticSource, executor: Box<dyn Executor + Send + Sync>) -> DailyCycle {
        DailyCycle::new(
            Box::new(source.clone()),
            Box::new(source.clone()),
            Box::new(source),
            Box::new(PortfolioRiskEvaluator::new(RiskConfig::default()).unwrap()),
            executor,
        )
    }

    fn paper(snapshot: &PortfolioSnapshot) -> Box<dyn Executor + Send + Sync> {
        Box::new(PaperExecutor::from_snapshot(SimulationSettings::default(), snapshot))
    }

    #[tokio::test]
    async fn stop_losses_execute_alongside_approved_buys() {
        // Equity 10,000: X is intended for sale and breached, Y is breached with no intent.
        let source = StaticSource {
            snapshot: Some(snapshot()),
            intents: vec![TradeIntent::buy("X", dec!(100)), TradeIntent::buy("Z", dec!(1000))],
            market: market(dec!(0.01)),
        };
        let mut cycle = cycle(source, paper(&snapshot()));
        let report = cycle.run_once().await.unwrap();

        assert_eq!(report.decisions.len(), 3);
        assert_eq!(report.decisions[0].symbol, Symbol::from("Y"));
        assert_eq!(report.decisions[0].reason, Some(DecisionReason::StopLoss));
        assert_eq!(report.decisions[1].side, Side::Sell);
        assert_eq!(report.decisions[1].reason, Some(DecisionReason::StopLoss));
        assert!(report.decisions[2].approved);

        assert_eq!(report.executions.len(), 3);
        assert!(report.failures.is_empty());

        let portfolio = cycle.executor().portfolio().unwrap();
        assert!(portfolio.holdings.get(&Symbol::from("X")).is_none());
        assert!(portfolio.holdings.get(&Symbol::from("Y")).is_none());
        assert_eq!(portfolio.shares(&Symbol::from("Z")), dec!(50));
        // 8,560 + 600 + 840 - 1,000
        assert_eq!(portfolio.cash, dec!(9000));
    }

    #[tokio::test]
    async fn cash_limited_buys_fill_under_slippage() {
        // Equity 10,000 with only 100 in cash: the Z buy is approved at 1,000 but
        // cash covers just 9 shares at 10 * 1.0005.
        let snapshot = PortfolioSnapshot::new(
            Some(dec!(100)),
            vec![Position {
                symbol: Symbol::from("A"),
                quantity: dec!(99),
                avg_entry_price: Some(dec!(100)),
                current_price: Some(dec!(100)),
                sector: Some("Technology".to_string()),
            }],
        )
        .unwrap();
        let market = MarketContext::default().with_quote(
            "Z",
            MarketQuote {
                avg_dollar_volume: Some(dec!(5000000)),
                last_price: Some(dec!(10)),
                sector: Some("Energy".to_string()),
            },
        );
        let source = StaticSource {
            snapshot: Some(snapshot.clone()),
            intents: vec![TradeIntent::buy("Z", dec!(1000))],
            market,
        };
        let settings = SimulationSettings { taker_fee: dec!(0), slippage_percent: dec!(0.0005) };
        let mut cycle = cycle(source, Box::new(PaperExecutor::from_snapshot(settings, &snapshot)));
        let report = cycle.run_once().await.unwrap();

        assert!(report.decisions[0].approved);
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.orders[0].quantity, dec!(9));
        assert!(report.failures.is_empty());
        assert_eq!(report.executions.len(), 1);

        let portfolio = cycle.executor().portfolio().unwrap();
        assert_eq!(portfolio.shares(&Symbol::from("Z")), dec!(9));
        // 100 - 9 * 10.005
        assert_eq!(portfolio.cash, dec!(9.955));
    }

    #[tokio::test]
    async fn circuit_breaker_halts_buys_but_not_stop_losses() {
        let source = StaticSource {
            snapshot: Some(snapshot()),
            intents: vec![TradeIntent::buy("Z", dec!(500))],
            market: market(dec!(0.06)),
        };
        let mut cycle = cycle(source, paper(&snapshot()));
        let report = cycle.run_once().await.unwrap();

        let buy = report.decisions.iter().find(|d| d.symbol == Symbol::from("Z")).unwrap();
        assert_eq!(buy.reason, Some(DecisionReason::CircuitBreaker));
        assert!(report.orders.iter().all(|o| o.side == Side::Sell));
        assert_eq!(report.executions.len(), 2);
    }

    struct RejectingExecutor;

    #[async_trait]
    impl Executor for RejectingExecutor {
        fn name(&self) -> &'static str {
            "RejectingExecutor"
        }

        async fn execute(&mut self, order: &OrderRequest) -> execution::Result<Execution> {
            Err(execution::Error::ExecutionFailed {
                reason: format!("market closed for {}", order.symbol),
            })
        }
    }

    #[tokio::test]
    async fn order_failures_are_recorded_not_fatal() {
        let source = StaticSource {
            snapshot: Some(snapshot()),
            intents: vec![],
            market: market(dec!(0)),
        };
        let mut cycle = cycle(source, Box::new(RejectingExecutor));
        let report = cycle.run_once().await.unwrap();

        assert_eq!(report.orders.len(), 2);
        assert!(report.executions.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].error.contains("market closed"));
    }

    #[tokio::test]
    async fn unusable_snapshot_aborts_before_trading() {
        let broken = PortfolioSnapshot::new(None, vec![]).unwrap();
        let source = StaticSource {
            snapshot: Some(broken.clone()),
            intents: vec![TradeIntent::buy("Z", dec!(100))],
            market: market(dec!(0)),
        };
        let mut cycle = cycle(source, paper(&broken));
        let err = cycle.run_once().await.unwrap_err();
        assert!(err.to_string().contains("Risk evaluation failed"));

        let mut empty = cycle_without_snapshot();
        assert!(empty.run_once().await.is_err());
    }

    fn cycle_without_snapshot() -> DailyCycle {
        let source = StaticSource::default();
        let executor = paper(&PortfolioSnapshot::with_cash(dec!(0)));
        cycle(source, executor)
    }
}
