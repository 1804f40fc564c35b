// In crates/risk/src/portfolio_evaluator.rs

use crate::decision::{DecisionReason, RiskDecision};
use crate::types::RiskConfig;
use crate::{Result, RiskEvaluator};
use core_types::{
    MarketContext, PortfolioSnapshot, Position, Side, Symbol, TradeIntent, UNCLASSIFIED_SECTOR,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// The portfolio-level risk evaluator.
///
/// Applies, per intent and in order: stop-loss precedence, the daily circuit
/// breaker, the liquidity filter, the position-size cap and the sector cap. The
/// first failing check decides the outcome. Caps trim a buy down to what fits
/// rather than rejecting it, unless nothing fits at all.
///
/// The evaluator holds only its configuration, so one instance can be shared across
/// threads and called with any number of snapshots.
#[derive(Debug, Clone)]
pub struct PortfolioRiskEvaluator {
    config: RiskConfig,
}

impl PortfolioRiskEvaluator {
    /// Creates a new evaluator, validating its limits up front.
    pub fn new(config: RiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}

impl RiskEvaluator for PortfolioRiskEvaluator {
    fn name(&self) -> &'static str {
        "PortfolioRiskEvaluator"
    }

    fn evaluate(
        &self,
        snapshot: &PortfolioSnapshot,
        intents: &[TradeIntent],
        market: &MarketContext,
    ) -> Result<Vec<RiskDecision>> {
        evaluate(snapshot, intents, market, &self.config)
    }

    fn stop_loss_sweep(
        &self,
        snapshot: &PortfolioSnapshot,
        intents: &[TradeIntent],
    ) -> Vec<RiskDecision> {
        stop_loss_sweep(snapshot, intents, &self.config)
    }
}

/// Evaluates every intent against the snapshot, returning one decision per intent
/// in input order.
///
/// Fails only when the snapshot or the configuration is unusable as a whole.
pub fn evaluate(
    snapshot: &PortfolioSnapshot,
    intents: &[TradeIntent],
    market: &MarketContext,
    config: &RiskConfig,
) -> Result<Vec<RiskDecision>> {
    config.validate()?;
    let mut pass = EvaluationPass::new(snapshot, market, config)?;

    if pass.breaker_tripped {
        tracing::warn!(
            daily_loss_pct = %market.daily_loss_pct,
            limit = %config.daily_loss_circuit_breaker_pct,
            "Daily loss circuit breaker tripped; buys are halted for this cycle."
        );
    }

    let decisions = intents
        .iter()
        .map(|intent| {
            let decision = pass.decide(intent);
            log_decision(intent, &decision);
            decision
        })
        .collect();

    Ok(decisions)
}

/// Forced liquidations for breached positions that no intent in the batch mentions.
///
/// Together with `evaluate`, this guarantees every breached holding is sold in the
/// cycle whether or not the decision source proposed anything for it.
pub fn stop_loss_sweep(
    snapshot: &PortfolioSnapshot,
    intents: &[TradeIntent],
    config: &RiskConfig,
) -> Vec<RiskDecision> {
    let mentioned: HashSet<&Symbol> = intents.iter().map(|i| &i.symbol).collect();

    snapshot
        .active_positions()
        .filter(|p| !mentioned.contains(&p.symbol))
        .filter_map(|position| {
            if position.avg_entry_price.is_none() {
                tracing::warn!(
                    symbol = %position.symbol,
                    "Position has no cost basis; stop-loss cannot be checked."
                );
                return None;
            }
            if !is_stop_loss_breached(position, config.stop_loss_pct) {
                return None;
            }
            tracing::warn!(
                symbol = %position.symbol,
                current_price = ?position.current_price,
                stop_price = ?position.stop_price(config.stop_loss_pct),
                "Stop-loss triggered! Liquidating position."
            );
            Some(RiskDecision::liquidate(position, None))
        })
        .collect()
}

/// True when the position's current price is strictly below its stop price.
pub fn is_stop_loss_breached(position: &Position, stop_loss_pct: Decimal) -> bool {
    match (position.current_price, position.stop_price(stop_loss_pct)) {
        (Some(current), Some(stop)) => current < stop,
        _ => false,
    }
}

fn log_decision(intent: &TradeIntent, decision: &RiskDecision) {
    match decision.reason {
        None => tracing::debug!(
            symbol = %intent.symbol,
            side = %intent.side,
            notional = %decision.adjusted_notional,
            "Intent approved."
        ),
        Some(DecisionReason::StopLoss) => tracing::warn!(
            symbol = %intent.symbol,
            requested_side = %intent.side,
            notional = %decision.adjusted_notional,
            "Stop-loss triggered! Intent overridden to a full liquidation."
        ),
        Some(reason) if decision.approved => tracing::info!(
            symbol = %intent.symbol,
            side = %intent.side,
            requested = ?intent.target_notional,
            approved = %decision.adjusted_notional,
            %reason,
            "Intent approved at a reduced size."
        ),
        Some(reason) => tracing::info!(
            symbol = %intent.symbol,
            side = %intent.side,
            requested = ?intent.target_notional,
            %reason,
            "Intent rejected."
        ),
    }
}

/// How much of a proposed addition fits under a cap.
enum Fit {
    Full,
    Partial(Decimal),
    Nothing,
}

/// Inclusive cap check: a post-trade value exactly at the cap fits.
fn fit_under_cap(current: Decimal, addition: Decimal, cap: Decimal) -> Fit {
    if current > cap {
        return Fit::Nothing;
    }
    let room = cap - current;
    if addition <= room {
        Fit::Full
    } else if room > Decimal::ZERO {
        Fit::Partial(room)
    } else {
        Fit::Nothing
    }
}

/// State for one call to `evaluate`.
///
/// Exposure starts at the snapshot's market values and moves with each approved
/// decision, so later intents in a batch see earlier approvals. The snapshot itself
/// is never touched.
struct EvaluationPass<'a> {
    snapshot: &'a PortfolioSnapshot,
    market: &'a MarketContext,
    config: &'a RiskConfig,
    position_cap: Decimal,
    sector_cap: Decimal,
    breaker_tripped: bool,
    symbol_exposure: HashMap<Symbol, Decimal>,
    sector_exposure: HashMap<String, Decimal>,
    sold: HashMap<Symbol, Decimal>,
    liquidating: HashSet<Symbol>,
}

impl<'a> EvaluationPass<'a> {
    fn new(
        snapshot: &'a PortfolioSnapshot,
        market: &'a MarketContext,
        config: &'a RiskConfig,
    ) -> Result<Self> {
        let equity = snapshot.equity()?;
        let cap = |pct: Decimal| pct.checked_mul(equity).ok_or(core_types::Error::EquityOverflow);

        let mut pass = Self {
            snapshot,
            market,
            config,
            position_cap: cap(config.position_cap_pct(market.bear_regime))?,
            sector_cap: cap(config.sector_max_pct)?,
            breaker_tripped: market.daily_loss_pct > config.daily_loss_circuit_breaker_pct,
            symbol_exposure: HashMap::new(),
            sector_exposure: HashMap::new(),
            sold: HashMap::new(),
            liquidating: HashSet::new(),
        };

        for position in snapshot.active_positions() {
            let value = position.market_value().unwrap_or_default();
            let sector = pass.sector_of(&position.symbol);
            *pass.symbol_exposure.entry(position.symbol.clone()).or_default() += value;
            *pass.sector_exposure.entry(sector).or_default() += value;
        }

        Ok(pass)
    }

    /// The held position's sector if it has one, else the quoted sector.
    fn sector_of(&self, symbol: &Symbol) -> String {
        match self.snapshot.position(symbol).map(Position::sector_or_default) {
            Some(sector) if sector != UNCLASSIFIED_SECTOR => sector.to_string(),
            _ => self.market.sector(symbol).to_string(),
        }
    }

    fn decide(&mut self, intent: &TradeIntent) -> RiskDecision {
        let symbol = &intent.symbol;
        let snapshot = self.snapshot;

        // --- Rule 1: Stop-loss precedence ---
        if self.liquidating.contains(symbol) {
            return RiskDecision::reject(intent, DecisionReason::StopLossPending);
        }
        if let Some(position) = snapshot.active_position(symbol) {
            if is_stop_loss_breached(position, self.config.stop_loss_pct) {
                return self.liquidate(intent, position);
            }
            // A buy adds to a holding whose stop-loss cannot be checked.
            if intent.side == Side::Buy && position.avg_entry_price.is_none() {
                return RiskDecision::reject(intent, DecisionReason::MissingData);
            }
        }

        // --- Intent validation ---
        let requested = match intent.target_notional {
            None => return RiskDecision::reject(intent, DecisionReason::MissingData),
            Some(notional) if notional <= Decimal::ZERO => {
                return RiskDecision::reject(intent, DecisionReason::InvalidSize);
            }
            Some(notional) => notional,
        };

        match intent.side {
            Side::Sell => self.decide_sell(intent, requested),
            Side::Buy => self.decide_buy(intent, requested),
        }
    }

    fn liquidate(&mut self, intent: &TradeIntent, position: &Position) -> RiskDecision {
        let decision = RiskDecision::liquidate(position, intent.target_notional);
        self.liquidating.insert(position.symbol.clone());
        self.shift_exposure(&position.symbol, -decision.adjusted_notional);
        decision
    }

    fn decide_sell(&mut self, intent: &TradeIntent, requested: Decimal) -> RiskDecision {
        let snapshot = self.snapshot;
        let Some(position) = snapshot.active_position(&intent.symbol) else {
            return RiskDecision::reject(intent, DecisionReason::NotHeld);
        };

        let already_sold = self.sold.get(&intent.symbol).copied().unwrap_or_default();
        let sellable = position.market_value().unwrap_or_default() - already_sold;
        if sellable <= Decimal::ZERO {
            return RiskDecision::reject(intent, DecisionReason::NotHeld);
        }

        let decision = if requested <= sellable {
            RiskDecision::approve(intent, requested, None)
        } else {
            RiskDecision::approve(intent, sellable, Some(DecisionReason::HoldingLimited))
        };

        *self.sold.entry(intent.symbol.clone()).or_default() += decision.adjusted_notional;
        self.shift_exposure(&intent.symbol, -decision.adjusted_notional);
        decision
    }

    fn decide_buy(&mut self, intent: &TradeIntent, requested: Decimal) -> RiskDecision {
        let symbol = &intent.symbol;

        // --- Rule 2: Circuit breaker ---
        if self.breaker_tripped {
            return RiskDecision::reject(intent, DecisionReason::CircuitBreaker);
        }

        // --- Rule 3: Liquidity filter ---
        match self.market.dollar_volume(symbol) {
            None => return RiskDecision::reject(intent, DecisionReason::MissingData),
            Some(volume) if volume < self.config.min_dollar_volume => {
                return RiskDecision::reject(intent, DecisionReason::LiquidityFilter);
            }
            Some(_) => {}
        }

        let mut notional = requested;
        let mut reason = None;

        // --- Rule 4: Position-size cap ---
        let held = self.symbol_exposure.get(symbol).copied().unwrap_or_default();
        match fit_under_cap(held, notional, self.position_cap) {
            Fit::Full => {}
            Fit::Partial(room) => {
                notional = room;
                reason = Some(DecisionReason::PositionCapReduced);
            }
            Fit::Nothing => {
                return RiskDecision::reject(intent, DecisionReason::PositionCapExceeded);
            }
        }

        // --- Rule 5: Sector cap ---
        let sector = self.sector_of(symbol);
        let sector_held = self.sector_exposure.get(&sector).copied().unwrap_or_default();
        match fit_under_cap(sector_held, notional, self.sector_cap) {
            Fit::Full => {}
            Fit::Partial(room) => {
                notional = room;
                reason = Some(DecisionReason::SectorCapReduced);
            }
            Fit::Nothing => {
                return RiskDecision::reject(intent, DecisionReason::SectorCapExceeded);
            }
        }

        self.shift_exposure(symbol, notional);
        RiskDecision::approve(intent, notional, reason)
    }

    fn shift_exposure(&mut self, symbol: &Symbol, delta: Decimal) {
        let sector = self.sector_of(symbol);
        *self.symbol_exposure.entry(symbol.clone()).or_default() += delta;
        *self.sector_exposure.entry(sector).or_default() += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::MarketQuote;
    use rust_decimal_macros::dec;

    fn position(symbol: &str, quantity: Decimal, entry: Decimal, price: Decimal, sector: &str) -> Position {
        Position {
            symbol: Symbol::from(symbol),
            quantity,
            avg_entry_price: Some(entry),
            current_price: Some(price),
            sector: Some(sector.to_string()),
        }
    }

    fn liquid(symbols: &[&str]) -> MarketContext {
        symbols.iter().fold(MarketContext::default(), |market, symbol| {
            market.with_quote(
                *symbol,
                MarketQuote { avg_dollar_volume: Some(dec!(1000000)), ..Default::default() },
            )
        })
    }

    #[test]
    fn fit_under_cap_is_inclusive() {
        assert!(matches!(fit_under_cap(dec!(1400), dec!(100), dec!(1500)), Fit::Full));
        assert!(matches!(fit_under_cap(dec!(1400), dec!(300), dec!(1500)), Fit::Partial(room) if room == dec!(100)));
        assert!(matches!(fit_under_cap(dec!(1500), dec!(1), dec!(1500)), Fit::Nothing));
        assert!(matches!(fit_under_cap(dec!(1600), dec!(1), dec!(1500)), Fit::Nothing));
    }

    #[test]
    fn stop_loss_boundary_is_not_a_breach() {
        // 10 * (1 - 0.15) = 8.50 exactly.
        let at_stop = position("Y", dec!(100), dec!(10), dec!(8.50), "Healthcare");
        let below = position("Y", dec!(100), dec!(10), dec!(8.49), "Healthcare");
        assert!(!is_stop_loss_breached(&at_stop, dec!(0.15)));
        assert!(is_stop_loss_breached(&below, dec!(0.15)));
    }

    #[test]
    fn batch_exposure_accumulates_across_intents() {
        let snapshot = PortfolioSnapshot::with_cash(dec!(10000));
        let intents = vec![TradeIntent::buy("X", dec!(1000)), TradeIntent::buy("X", dec!(1000))];
        let decisions =
            evaluate(&snapshot, &intents, &liquid(&["X"]), &RiskConfig::default()).unwrap();

        assert_eq!(decisions[0].adjusted_notional, dec!(1000));
        assert_eq!(decisions[0].reason, None);
        assert_eq!(decisions[1].adjusted_notional, dec!(500));
        assert_eq!(decisions[1].reason, Some(DecisionReason::PositionCapReduced));
    }

    #[test]
    fn sell_frees_room_for_a_later_buy() {
        let snapshot = PortfolioSnapshot::new(
            Some(dec!(8500)),
            vec![position("X", dec!(10), dec!(100), dec!(150), "Technology")],
        )
        .unwrap();
        let intents = vec![TradeIntent::sell("X", dec!(500)), TradeIntent::buy("X", dec!(500))];
        let decisions =
            evaluate(&snapshot, &intents, &liquid(&["X"]), &RiskConfig::default()).unwrap();

        assert!(decisions[0].approved);
        assert_eq!(decisions[1].adjusted_notional, dec!(500));
        assert_eq!(decisions[1].reason, None);
    }

    #[test]
    fn oversized_sell_is_limited_to_the_holding() {
        let snapshot = PortfolioSnapshot::new(
            Some(dec!(1000)),
            vec![position("X", dec!(10), dec!(100), dec!(100), "Technology")],
        )
        .unwrap();
        let intents = vec![TradeIntent::sell("X", dec!(5000)), TradeIntent::sell("X", dec!(10))];
        let decisions =
            evaluate(&snapshot, &intents, &MarketContext::default(), &RiskConfig::default())
                .unwrap();

        assert_eq!(decisions[0].adjusted_notional, dec!(1000));
        assert_eq!(decisions[0].reason, Some(DecisionReason::HoldingLimited));
        assert_eq!(decisions[1].reason, Some(DecisionReason::NotHeld));
    }

    #[test]
    fn sector_cap_trims_after_position_cap() {
        // Equity 10,000; sector cap 40% = 4,000 with 3,800 already in Technology.
        let snapshot = PortfolioSnapshot::new(
            Some(dec!(6200)),
            vec![
                position("A", dec!(10), dec!(100), dec!(130), "Technology"),
                position("B", dec!(10), dec!(100), dec!(125), "Technology"),
                position("C", dec!(10), dec!(100), dec!(125), "Technology"),
            ],
        )
        .unwrap();
        let market = liquid(&["D"]).with_quote(
            "D",
            MarketQuote {
                avg_dollar_volume: Some(dec!(1000000)),
                last_price: Some(dec!(5)),
                sector: Some("Technology".to_string()),
            },
        );
        let decisions = evaluate(
            &snapshot,
            &[TradeIntent::buy("D", dec!(1000))],
            &market,
            &RiskConfig::default(),
        )
        .unwrap();

        assert!(decisions[0].approved);
        assert_eq!(decisions[0].adjusted_notional, dec!(200));
        assert_eq!(decisions[0].reason, Some(DecisionReason::SectorCapReduced));
    }

    #[test]
    fn missing_sector_falls_into_unclassified() {
        // Two unclassified symbols share one bucket: 3,900 held, cap 4,000.
        let snapshot = PortfolioSnapshot::new(
            Some(dec!(6100)),
            vec![Position {
                symbol: Symbol::from("OLD"),
                quantity: dec!(30),
                avg_entry_price: Some(dec!(100)),
                current_price: Some(dec!(130)),
                sector: None,
            }],
        )
        .unwrap();
        let decisions = evaluate(
            &snapshot,
            &[TradeIntent::buy("NEW", dec!(500))],
            &liquid(&["NEW"]),
            &RiskConfig::default(),
        )
        .unwrap();

        assert_eq!(decisions[0].adjusted_notional, dec!(100));
        assert_eq!(decisions[0].reason, Some(DecisionReason::SectorCapReduced));
    }

    #[test]
    fn buy_on_holding_without_cost_basis_is_missing_data() {
        let snapshot = PortfolioSnapshot::new(
            Some(dec!(1000)),
            vec![Position {
                symbol: Symbol::from("X"),
                quantity: dec!(1),
                avg_entry_price: None,
                current_price: Some(dec!(10)),
                sector: None,
            }],
        )
        .unwrap();
        let decisions = evaluate(
            &snapshot,
            &[TradeIntent::buy("X", dec!(10)), TradeIntent::sell("X", dec!(10))],
            &liquid(&["X"]),
            &RiskConfig::default(),
        )
        .unwrap();

        assert_eq!(decisions[0].reason, Some(DecisionReason::MissingData));
        assert!(decisions[1].approved);
    }

    #[test]
    fn invalid_config_is_fatal() {
        let config = RiskConfig { max_position_pct: dec!(0), ..RiskConfig::default() };
        let result = evaluate(
            &PortfolioSnapshot::with_cash(dec!(100)),
            &[],
            &MarketContext::default(),
            &config,
        );
        assert!(matches!(result, Err(crate::Error::InvalidParameters(_))));
        assert!(PortfolioRiskEvaluator::new(config).is_err());
    }
}
