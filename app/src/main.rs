// In app/src/main.rs

use analytics::{PerformanceSummary, PortfolioReport, period_return, regime_signals};
use anyhow::{Context, Result};
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::PortfolioSnapshot;
use engine::{
    DailyCycle, DecisionSource, JsonDecisionSource, JsonMarketSource, JsonPositionSource,
    MarketDataSource, PositionSource,
};
use execution::PaperExecutor;
use risk::{PortfolioRiskEvaluator, RiskDecision, RiskEvaluator};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Portfolio risk gate for a daily long-only trading routine.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates a batch of intents against a snapshot and prints the decisions.
    Evaluate {
        /// Portfolio snapshot JSON. Defaults to the configured path.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Trade intents or upstream decision records JSON.
        #[arg(long)]
        intents: Option<PathBuf>,

        /// Market context JSON (regime flag, daily loss, quotes).
        #[arg(long)]
        market: Option<PathBuf>,
    },

    /// Runs one full daily cycle against the paper executor.
    RunOnce,

    /// Prints the end-of-day portfolio report.
    Report {
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Starting capital, for the return and alpha summary.
        #[arg(long)]
        starting_cash: Option<Decimal>,

        /// Benchmark daily closes (JSON array) for the alpha summary.
        #[arg(long)]
        benchmark: Option<PathBuf>,
    },

    /// Classifies the market regime from index closes (JSON array, oldest first).
    Regime {
        #[arg(long)]
        closes: PathBuf,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings().context("Failed to load settings")?;

    // --- Tracing Setup ---
    let level = settings
        .app
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new().with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();

    // Parse command-line arguments.
    let cli = Cli::parse();

    tracing::info!(environment = %settings.app.environment, "Starting riskgate");

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Evaluate {
            snapshot,
            intents,
            market,
        } => {
            handle_evaluate(&settings, snapshot, intents, market).await?;
        }
        Commands::RunOnce => {
            handle_run_once(&settings).await?;
        }
        Commands::Report {
            snapshot,
            starting_cash,
            benchmark,
        } => {
            handle_report(&settings, snapshot, starting_cash, benchmark).await?;
        }
        Commands::Regime { closes } => {
            handle_regime(&closes)?;
        }
    }

    Ok(())
}

// --- "Evaluate" Subcommand Logic ---

async fn handle_evaluate(
    settings: &Settings,
    snapshot: Option<PathBuf>,
    intents: Option<PathBuf>,
    market: Option<PathBuf>,
) -> Result<()> {
    let snapshot_path = snapshot.unwrap_or_else(|| settings.data.snapshot_path.clone());
    let intents_path = intents.unwrap_or_else(|| settings.data.intents_path.clone());
    let market_path = market.unwrap_or_else(|| settings.data.market_path.clone());

    let snapshot = JsonPositionSource::new(snapshot_path).load_snapshot().await?;
    let market = JsonMarketSource::new(market_path).load_market().await?;
    let intents = JsonDecisionSource::new(intents_path).load_intents(&snapshot).await?;

    let evaluator = PortfolioRiskEvaluator::new(settings.risk.clone())?;
    let mut decisions = evaluator.stop_loss_sweep(&snapshot, &intents);
    decisions.extend(evaluator.evaluate(&snapshot, &intents, &market)?);

    print_decisions(&decisions);
    println!("\n{}", serde_json::to_string_pretty(&decisions)?);
    Ok(())
}

fn print_decisions(decisions: &[RiskDecision]) {
    println!("\n--- Risk Decisions ---");
    println!("{:<8} {:<5} {:<9} {:>14} {:>14}  {}", "SYMBOL", "SIDE", "STATUS", "REQUESTED", "APPROVED", "REASON");
    for d in decisions {
        let requested = d.requested_notional.map(|n| n.round_dp(2).to_string()).unwrap_or_else(|| "-".into());
        let reason = d.reason.map(|r| r.to_string()).unwrap_or_default();
        println!(
            "{:<8} {:<5} {:<9} {:>14} {:>14}  {}",
            d.symbol,
            d.side,
            if d.approved { "approved" } else { "rejected" },
            requested,
            d.adjusted_notional.round_dp(2),
            reason
        );
    }
}

// --- "RunOnce" Subcommand Logic ---

async fn handle_run_once(settings: &Settings) -> Result<()> {
    let positions = JsonPositionSource::new(settings.data.snapshot_path.clone());
    // The paper account starts from the same snapshot the cycle evaluates.
    let starting_snapshot = positions.load_snapshot().await?;
    let executor = PaperExecutor::from_snapshot(settings.paper.clone(), &starting_snapshot);

    let mut cycle = DailyCycle::new(
        Box::new(positions),
        Box::new(JsonDecisionSource::new(settings.data.intents_path.clone())),
        Box::new(JsonMarketSource::new(settings.data.market_path.clone())),
        Box::new(PortfolioRiskEvaluator::new(settings.risk.clone())?),
        Box::new(executor),
    );
    let report = cycle.run_once().await?;

    print_decisions(&report.decisions);
    println!("\n--- Executions ---");
    for e in &report.executions {
        println!("  {} {} {} @ {} (fee {})", e.side, e.quantity, e.symbol, e.price.round_dp(4), e.fee.round_dp(4));
    }
    for f in &report.failures {
        println!("  FAILED {} {} {}: {}", f.order.side, f.order.quantity, f.order.symbol, f.error);
    }
    if let Some(portfolio) = cycle.executor().portfolio() {
        println!("\nPaper cash after cycle: ${}", portfolio.cash.round_dp(2));
    }
    Ok(())
}

// --- "Report" Subcommand Logic ---

async fn handle_report(
    settings: &Settings,
    snapshot: Option<PathBuf>,
    starting_cash: Option<Decimal>,
    benchmark: Option<PathBuf>,
) -> Result<()> {
    let path = snapshot.unwrap_or_else(|| settings.data.snapshot_path.clone());
    let snapshot: PortfolioSnapshot = JsonPositionSource::new(path).load_snapshot().await?;
    let report = PortfolioReport::from_snapshot(&snapshot, settings.risk.stop_loss_pct)?;

    println!("\n--- Portfolio Report ({}) ---", report.generated_at.format("%Y-%m-%d"));
    println!(
        "{:<8} {:<14} {:>10} {:>10} {:>10} {:>10} {:>12} {:>12}",
        "SYMBOL", "SECTOR", "SHARES", "COST", "STOP", "PRICE", "VALUE", "PNL"
    );
    let show = |v: Option<Decimal>| v.map(|d| d.round_dp(2).to_string()).unwrap_or_else(|| "-".into());
    for row in &report.rows {
        println!(
            "{:<8} {:<14} {:>10} {:>10} {:>10} {:>10} {:>12} {:>12}{}",
            row.symbol,
            row.sector,
            row.shares,
            show(row.cost_basis),
            show(row.stop_price),
            show(row.current_price),
            show(row.market_value),
            show(row.unrealized_pnl),
            if row.stop_breached { "  STOP" } else { "" }
        );
    }
    println!("---------------------------------");
    println!("Positions: ${}", report.total_position_value.round_dp(2));
    println!("Unrealized P&L: ${}", report.total_unrealized_pnl.round_dp(2));
    println!("Cash: ${}", report.cash.round_dp(2));
    println!("Total equity: ${}", report.total_equity.round_dp(2));

    if let Some(starting_cash) = starting_cash {
        let benchmark_return = match benchmark {
            Some(path) => period_return(&read_closes(&path)?).unwrap_or_default(),
            None => Decimal::ZERO,
        };
        let summary = PerformanceSummary::new(starting_cash, report.total_equity, benchmark_return);
        println!(
            "Total return: {}% | Benchmark: {}% | Alpha: {}%",
            (summary.total_return * Decimal::ONE_HUNDRED).round_dp(2),
            (summary.benchmark_return * Decimal::ONE_HUNDRED).round_dp(2),
            (summary.alpha * Decimal::ONE_HUNDRED).round_dp(2)
        );
    }
    Ok(())
}

// --- "Regime" Subcommand Logic ---

fn handle_regime(path: &Path) -> Result<()> {
    let closes = read_closes(path)?;
    match regime_signals(&closes) {
        Some(signals) => {
            println!(
                "Regime: {} (SMA50 {} | SMA200 {} | 20d vol {:.2}%)",
                signals.regime,
                signals.sma_50.round_dp(2),
                signals.sma_200.round_dp(2),
                signals.volatility * 100.0
            );
            println!("bear_regime = {}", signals.regime.is_bear());
        }
        None => println!("Regime: unknown ({} closes, need 200)", closes.len()),
    }
    Ok(())
}

fn read_closes(path: &Path) -> Result<Vec<Decimal>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
