//! # engine — prediction-driven decision engine
//!
//! Lifecycle, independent of any backtesting host:
//!
//! ```text
//! on_init(client)  ── one blocking fetch, lenient parse, never re-fetched
//!     │
//! on_tick(tick) ───▶ Decision      (once per trading day, in order)
//!     │
//! on_finish(pf) ───▶ RunSummary
//! ```
//!
//! ## Rule
//!
//! With `r = (projected - current) / current` for today's date in the active
//! projection map:
//!
//! | state      | condition        | decision     | next state |
//! |------------|------------------|--------------|------------|
//! | `Flat`     | `r >  threshold` | `EnterLong`  | `Invested` |
//! | `Invested` | `r < -threshold` | `ExitIfHeld` | `Flat`     |
//! | any        | otherwise        | `Hold`       | unchanged  |
//!
//! A date with no projection is always `Hold`.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::chart::{Chart, ACTUAL_PRICE, CLUSTERED_PREDICTION, CONSOLIDATED_PREDICTION};
use crate::config::{ProjectionVariant, StrategyConfig};
use crate::fetch::{load_projections, PriceMap, ProjectionClient, ProjectionQuery, ProjectionSeries};
use crate::market::MarketTick;
use crate::portfolio::Portfolio;

pub const CHART_TITLE: &str = "Predictions vs Actual";

// ─── State & Decision ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    #[default]
    Flat,
    Invested,
}

/// Inputs behind a decision on a day that has a projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub date: NaiveDate,
    pub current_price: f64,
    pub projected_price: f64,
    pub expected_return: f64,
}

impl Signal {
    pub fn new(date: NaiveDate, current_price: f64, projected_price: f64) -> Self {
        Self {
            date,
            current_price,
            projected_price,
            expected_return: (projected_price - current_price) / current_price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldReason {
    /// Tick for a symbol this engine does not trade.
    OtherSymbol,
    /// No projection for the tick's date.
    NoProjection,
    /// Tick price is zero, negative or not a number.
    InvalidPrice,
    /// |expected return| did not clear the threshold.
    WithinThreshold(Signal),
    /// Signal cleared the threshold but we are already on that side.
    AlreadyPositioned(Signal),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Target 100% of the portfolio in the symbol.
    EnterLong(Signal),
    /// Liquidate the position.
    ExitIfHeld(Signal),
    Hold(HoldReason),
}

// ─── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub symbol: String,
    pub starting_cash: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub entries: u32,
    pub exits: u32,
    pub final_state: PositionState,
}

// ─── Engine ───────────────────────────────────────────────────────────────────

pub struct DecisionEngine {
    run_id: Uuid,
    config: StrategyConfig,
    projections: ProjectionSeries,
    state: PositionState,
    chart: Chart,
    entries: u32,
    exits: u32,
}

impl DecisionEngine {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config,
            projections: ProjectionSeries::default(),
            state: PositionState::Flat,
            chart: Chart::new(CHART_TITLE),
            entries: 0,
            exits: 0,
        }
    }

    /// Engine with projections already in hand (tests, replays).
    pub fn with_projections(config: StrategyConfig, projections: ProjectionSeries) -> Self {
        let mut engine = Self::new(config);
        engine.projections = projections;
        engine
    }

    /// Load projections once.  Any failure is logged and the run continues
    /// with an empty series, i.e. every tick will `Hold`.
    pub fn on_init(&mut self, client: &dyn ProjectionClient, query: &ProjectionQuery) {
        match load_projections(client, query) {
            Ok(series) => {
                info!(
                    run_id       = %self.run_id,
                    clustered    = series.clustered.len(),
                    consolidated = series.consolidated.len(),
                    "[API] Successfully loaded predictions"
                );
                self.projections = series;
            }
            Err(e) => {
                error!(run_id = %self.run_id, error = %e, "[API] Loading predictions failed — continuing without them");
            }
        }

        let first: Vec<NaiveDate> = self.active().keys().take(3).copied().collect();
        if !first.is_empty() {
            debug!(?first, "[API] First prediction dates");
        }
    }

    /// Evaluate one tick.  Ticks must arrive in time order, one at a time.
    pub fn on_tick(&mut self, tick: &MarketTick) -> Decision {
        if tick.symbol != self.config.symbol {
            return Decision::Hold(HoldReason::OtherSymbol);
        }

        let today = tick.date();
        self.record(today, tick.price);

        if !(tick.price.is_finite() && tick.price > 0.0) {
            warn!(date = %today, price = tick.price, "Unusable tick price — hold");
            return Decision::Hold(HoldReason::InvalidPrice);
        }

        let Some(&projected) = self.active().get(&today) else {
            debug!(date = %today, "No projection for today — hold");
            return Decision::Hold(HoldReason::NoProjection);
        };

        let signal = Signal::new(today, tick.price, projected);
        let decision = decide(self.state, &signal, self.config.threshold);

        match decision {
            Decision::EnterLong(s) => {
                self.state = PositionState::Invested;
                self.entries += 1;
                info!(
                    date      = %s.date,
                    current   = %format!("${:.2}", s.current_price),
                    predicted = %format!("${:.2}", s.projected_price),
                    expected  = %format!("{:.2}%", s.expected_return * 100.0),
                    "[TRADE] BUY"
                );
            }
            Decision::ExitIfHeld(s) => {
                self.state = PositionState::Flat;
                self.exits += 1;
                info!(
                    date      = %s.date,
                    current   = %format!("${:.2}", s.current_price),
                    predicted = %format!("${:.2}", s.projected_price),
                    expected  = %format!("{:.2}%", s.expected_return * 100.0),
                    "[TRADE] SELL"
                );
            }
            Decision::Hold(reason) => {
                debug!(date = %today, ?reason, "Hold");
            }
        }

        decision
    }

    /// Reconcile with the broker after acting on `decision`.
    ///
    /// `invested` is whether the portfolio holds the symbol after the order.
    /// An entry that bought nothing (or an exit that left shares behind) is
    /// rolled back so the state and the trade counts follow the fill.
    pub fn confirm_fill(&mut self, decision: &Decision, invested: bool) {
        match decision {
            Decision::EnterLong(s) if !invested => {
                warn!(date = %s.date, "[TRADE] BUY not filled — staying flat");
                self.state = PositionState::Flat;
                self.entries = self.entries.saturating_sub(1);
            }
            Decision::ExitIfHeld(s) if invested => {
                warn!(date = %s.date, "[TRADE] SELL not filled — still invested");
                self.state = PositionState::Invested;
                self.exits = self.exits.saturating_sub(1);
            }
            _ => {}
        }
    }

    /// Close out the run and log the summary.
    pub fn on_finish(&self, portfolio: &dyn Portfolio, starting_cash: f64) -> RunSummary {
        let final_value = portfolio.total_value();
        let total_return_pct = if starting_cash > 0.0 {
            (final_value / starting_cash - 1.0) * 100.0
        } else {
            0.0
        };

        let summary = RunSummary {
            run_id: self.run_id,
            symbol: self.config.symbol.clone(),
            starting_cash,
            final_value,
            total_return_pct,
            entries: self.entries,
            exits: self.exits,
            final_state: self.state,
        };

        info!(
            run_id       = %summary.run_id,
            final_value  = %format!("${:.2}", summary.final_value),
            total_return = %format!("{:.2}%", summary.total_return_pct),
            entries      = summary.entries,
            exits        = summary.exits,
            final_state  = ?summary.final_state,
            "📊 BACKTEST SUMMARY"
        );

        summary
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn projections(&self) -> &ProjectionSeries {
        &self.projections
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// The projection map that drives trading this run.
    fn active(&self) -> &PriceMap {
        match self.config.variant {
            ProjectionVariant::Clustered => &self.projections.clustered,
            ProjectionVariant::Consolidated => &self.projections.consolidated,
        }
    }

    /// Actual price plus whichever projections exist for `date`.
    fn record(&mut self, date: NaiveDate, price: f64) {
        self.chart.plot(ACTUAL_PRICE, date, price);
        if let Some(&p) = self.projections.clustered.get(&date) {
            self.chart.plot(CLUSTERED_PREDICTION, date, p);
        }
        if let Some(&p) = self.projections.consolidated.get(&date) {
            self.chart.plot(CONSOLIDATED_PREDICTION, date, p);
        }
    }
}

/// The threshold rule, free of engine state.
pub fn decide(state: PositionState, signal: &Signal, threshold: f64) -> Decision {
    let r = signal.expected_return;

    if r > threshold {
        match state {
            PositionState::Flat => Decision::EnterLong(*signal),
            PositionState::Invested => Decision::Hold(HoldReason::AlreadyPositioned(*signal)),
        }
    } else if r < -threshold {
        match state {
            PositionState::Invested => Decision::ExitIfHeld(*signal),
            PositionState::Flat => Decision::Hold(HoldReason::AlreadyPositioned(*signal)),
        }
    } else {
        Decision::Hold(HoldReason::WithinThreshold(*signal))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::portfolio::PaperPortfolio;
    use chrono::{TimeZone, Utc};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn tick(symbol: &str, m: u32, d: u32, price: f64) -> MarketTick {
        MarketTick {
            symbol: symbol.to_string(),
            time: Utc.with_ymd_and_hms(2024, m, d, 20, 0, 0).unwrap(),
            price,
        }
    }

    fn engine_with(clustered: &[(NaiveDate, f64)], consolidated: &[(NaiveDate, f64)]) -> DecisionEngine {
        DecisionEngine::with_projections(
            StrategyConfig::default(),
            ProjectionSeries {
                clustered: clustered.iter().copied().collect(),
                consolidated: consolidated.iter().copied().collect(),
            },
        )
    }

    struct StubClient(Result<String, FetchError>);

    impl ProjectionClient for StubClient {
        fn fetch(&self, _query: &ProjectionQuery) -> Result<String, FetchError> {
            self.0.clone()
        }
    }

    // ── decide() ──────────────────────────────────────────────────────────────

    #[test]
    fn flat_and_return_above_threshold_enters_long() {
        let signal = Signal::new(day(10, 29), 570.0, 580.0);
        assert!((signal.expected_return - 0.017_543_859_6).abs() < 1e-9);
        assert_eq!(decide(PositionState::Flat, &signal, 0.01), Decision::EnterLong(signal));
    }

    #[test]
    fn return_below_threshold_holds() {
        let signal = Signal::new(day(10, 29), 570.0, 572.0);
        for state in [PositionState::Flat, PositionState::Invested] {
            assert_eq!(
                decide(state, &signal, 0.01),
                Decision::Hold(HoldReason::WithinThreshold(signal))
            );
        }
    }

    #[test]
    fn invested_and_return_below_negative_threshold_exits() {
        let signal = Signal::new(day(10, 29), 590.0, 580.0);
        assert!(signal.expected_return < -0.0169 && signal.expected_return > -0.0170);
        assert_eq!(decide(PositionState::Invested, &signal, 0.01), Decision::ExitIfHeld(signal));
    }

    #[test]
    fn signals_on_the_held_side_hold() {
        let up = Signal::new(day(10, 29), 570.0, 580.0);
        let down = Signal::new(day(10, 29), 590.0, 580.0);
        assert_eq!(
            decide(PositionState::Invested, &up, 0.01),
            Decision::Hold(HoldReason::AlreadyPositioned(up))
        );
        assert_eq!(
            decide(PositionState::Flat, &down, 0.01),
            Decision::Hold(HoldReason::AlreadyPositioned(down))
        );
    }

    #[test]
    fn threshold_is_strict() {
        let signal = Signal::new(day(10, 29), 100.0, 101.0);
        assert!(matches!(
            decide(PositionState::Flat, &signal, 0.01),
            Decision::Hold(HoldReason::WithinThreshold(_))
        ));
    }

    // ── on_tick() ─────────────────────────────────────────────────────────────

    #[test]
    fn enter_then_exit_transitions_state() {
        let mut engine = engine_with(&[(day(10, 29), 580.0), (day(10, 30), 580.0)], &[]);

        let first = engine.on_tick(&tick("SPY", 10, 29, 570.0));
        assert!(matches!(first, Decision::EnterLong(_)));
        assert_eq!(engine.state(), PositionState::Invested);

        let second = engine.on_tick(&tick("SPY", 10, 30, 590.0));
        assert!(matches!(second, Decision::ExitIfHeld(_)));
        assert_eq!(engine.state(), PositionState::Flat);
    }

    #[test]
    fn missing_projection_holds_in_either_state() {
        let mut engine = engine_with(&[(day(10, 29), 580.0)], &[]);

        assert_eq!(
            engine.on_tick(&tick("SPY", 10, 28, 570.0)),
            Decision::Hold(HoldReason::NoProjection)
        );

        engine.on_tick(&tick("SPY", 10, 29, 570.0));
        assert_eq!(engine.state(), PositionState::Invested);

        assert_eq!(
            engine.on_tick(&tick("SPY", 11, 20, 10.0)),
            Decision::Hold(HoldReason::NoProjection)
        );
        assert_eq!(engine.state(), PositionState::Invested);
    }

    #[test]
    fn other_symbols_are_ignored_entirely() {
        let mut engine = engine_with(&[(day(10, 29), 580.0)], &[]);

        let decision = engine.on_tick(&tick("QQQ", 10, 29, 400.0));

        assert_eq!(decision, Decision::Hold(HoldReason::OtherSymbol));
        assert_eq!(engine.state(), PositionState::Flat);
        assert!(engine.chart().points(ACTUAL_PRICE).is_empty());
    }

    #[test]
    fn consolidated_variant_drives_trading_when_selected() {
        let config = StrategyConfig {
            variant: ProjectionVariant::Consolidated,
            ..StrategyConfig::default()
        };
        let mut engine = DecisionEngine::with_projections(
            config,
            ProjectionSeries {
                clustered: [(day(10, 29), 500.0)].into_iter().collect(),
                consolidated: [(day(10, 29), 580.0)].into_iter().collect(),
            },
        );

        assert!(matches!(
            engine.on_tick(&tick("SPY", 10, 29, 570.0)),
            Decision::EnterLong(s) if s.projected_price == 580.0
        ));
    }

    #[test]
    fn chart_records_actual_and_both_variants() {
        let mut engine = engine_with(&[(day(10, 29), 573.2)], &[(day(10, 29), 573.6)]);

        engine.on_tick(&tick("SPY", 10, 29, 581.77));
        engine.on_tick(&tick("SPY", 10, 30, 580.01));

        let chart = engine.chart();
        assert_eq!(chart.points(ACTUAL_PRICE).len(), 2);
        assert_eq!(chart.points(CLUSTERED_PREDICTION).len(), 1);
        assert_eq!(chart.points(CONSOLIDATED_PREDICTION)[0].value, 573.6);
    }

    #[test]
    fn non_positive_price_holds_without_state_change() {
        let mut engine = engine_with(&[(day(10, 29), 580.0)], &[]);
        assert_eq!(
            engine.on_tick(&tick("SPY", 10, 29, 0.0)),
            Decision::Hold(HoldReason::InvalidPrice)
        );
        assert_eq!(engine.state(), PositionState::Flat);

        let actual = engine.chart().points(ACTUAL_PRICE);
        assert_eq!(actual.len(), 1);
        assert_eq!(actual[0].value, 0.0);
        assert_eq!(engine.chart().points(CLUSTERED_PREDICTION).len(), 1);
    }

    // ── confirm_fill() ────────────────────────────────────────────────────────

    #[test]
    fn unfilled_entry_rolls_back_to_flat() {
        let mut engine = engine_with(&[(day(10, 29), 580.0), (day(10, 30), 600.0)], &[]);
        let mut pf = PaperPortfolio::new(500.0);

        let decision = engine.on_tick(&tick("SPY", 10, 29, 570.0));
        assert!(matches!(decision, Decision::EnterLong(_)));
        pf.set_holdings("SPY", 1.0, 570.0);
        engine.confirm_fill(&decision, pf.is_invested("SPY"));

        assert_eq!(pf.shares("SPY"), 0);
        assert_eq!(engine.state(), PositionState::Flat);

        let summary = engine.on_finish(&pf, 500.0);
        assert_eq!(summary.entries, 0);
        assert_eq!(summary.final_state, PositionState::Flat);

        // Still flat, so the next upward signal tries again.
        assert!(matches!(
            engine.on_tick(&tick("SPY", 10, 30, 450.0)),
            Decision::EnterLong(_)
        ));
    }

    #[test]
    fn filled_orders_keep_the_transition() {
        let mut engine = engine_with(&[(day(10, 29), 580.0), (day(10, 30), 580.0)], &[]);

        let enter = engine.on_tick(&tick("SPY", 10, 29, 570.0));
        engine.confirm_fill(&enter, true);
        assert_eq!(engine.state(), PositionState::Invested);

        let exit = engine.on_tick(&tick("SPY", 10, 30, 590.0));
        engine.confirm_fill(&exit, false);
        assert_eq!(engine.state(), PositionState::Flat);

        let summary = engine.on_finish(&PaperPortfolio::new(1_000.0), 1_000.0);
        assert_eq!((summary.entries, summary.exits), (1, 1));
    }

    #[test]
    fn exit_that_leaves_shares_stays_invested() {
        let mut engine = engine_with(&[(day(10, 29), 580.0), (day(10, 30), 580.0)], &[]);
        engine.on_tick(&tick("SPY", 10, 29, 570.0));

        let exit = engine.on_tick(&tick("SPY", 10, 30, 590.0));
        engine.confirm_fill(&exit, true);

        assert_eq!(engine.state(), PositionState::Invested);
        assert_eq!(engine.on_finish(&PaperPortfolio::new(1.0), 1.0).exits, 0);
    }

    // ── on_init() ─────────────────────────────────────────────────────────────

    #[test]
    fn init_loads_projections_from_client() {
        let body = r#"{
            "clusteredProjection":    { "2024-10-29": 573.2, "bad": 1.0 },
            "consolidatedProjection": { "2024-10-29": 573.6 }
        }"#;
        let mut engine = DecisionEngine::new(StrategyConfig::default());

        engine.on_init(&StubClient(Ok(body.to_string())), &ProjectionQuery::default());

        assert_eq!(engine.projections().clustered.len(), 1);
        assert_eq!(engine.projections().consolidated[&day(10, 29)], 573.6);
    }

    #[test]
    fn init_without_clustered_leaves_engine_empty_and_holding() {
        let body = r#"{ "consolidatedProjection": { "2024-10-29": 573.6 } }"#;
        let mut engine = DecisionEngine::new(StrategyConfig::default());

        engine.on_init(&StubClient(Ok(body.to_string())), &ProjectionQuery::default());

        assert!(engine.projections().clustered.is_empty());
        assert!(engine.projections().consolidated.is_empty());
        assert_eq!(
            engine.on_tick(&tick("SPY", 10, 29, 500.0)),
            Decision::Hold(HoldReason::NoProjection)
        );
    }

    #[test]
    fn init_survives_transport_failure() {
        let mut engine = DecisionEngine::new(StrategyConfig::default());
        engine.on_init(
            &StubClient(Err(FetchError::Transport("connection refused".into()))),
            &ProjectionQuery::default(),
        );
        assert!(engine.projections().is_empty());
    }

    // ── on_finish() ───────────────────────────────────────────────────────────

    #[test]
    fn finish_reports_return_and_trade_counts() {
        let mut engine = engine_with(&[(day(10, 29), 580.0), (day(10, 30), 580.0)], &[]);
        let mut pf = PaperPortfolio::new(1_000.0);

        if let Decision::EnterLong(s) = engine.on_tick(&tick("SPY", 10, 29, 100.0)) {
            pf.set_holdings("SPY", 1.0, s.current_price);
        }
        pf.mark("SPY", 110.0);

        let summary = engine.on_finish(&pf, 1_000.0);

        assert_eq!(summary.entries, 1);
        assert_eq!(summary.exits, 0);
        assert_eq!(summary.final_state, PositionState::Invested);
        assert!((summary.final_value - 1_100.0).abs() < 1e-9);
        assert!((summary.total_return_pct - 10.0).abs() < 1e-9);
    }
}
