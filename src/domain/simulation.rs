//! Bar-by-bar simulation over a unified multi-symbol timeline.
//!
//! Each timeline step runs, in order: daily reset, exit checks for open
//! positions, entry scanning, and one equity point. After the last step any
//! remaining position is force-closed.

use crate::domain::bar_series::{BarSeries, DateRange, build_unified_timeline};
use crate::domain::config::StrategyConfig;
use crate::domain::detector::SetupDetector;
use crate::domain::metrics::Report;
use crate::domain::portfolio::{EquityPoint, SimulationState};
use crate::domain::position::{ExitReason, OpenPosition, TradeRecord};
use crate::domain::scanner::best_setup;
use crate::domain::setup::Setup;
use crate::domain::sizing::size_position;
use chrono::NaiveDateTime;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub report: Report,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    config: StrategyConfig,
    detector: SetupDetector,
}

impl Simulator {
    pub fn new(config: StrategyConfig) -> Self {
        let detector = SetupDetector::new(&config);
        Self { config, detector }
    }

    pub fn with_detector(config: StrategyConfig, detector: SetupDetector) -> Self {
        Self { config, detector }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Runs the full simulation. Identical inputs give identical results.
    pub fn run(&self, series: &[BarSeries], range: &DateRange) -> SimulationResult {
        let timeline = build_unified_timeline(series, range);
        let mut state = SimulationState::new(self.config.capital.amount);

        info!(
            symbols = series.len(),
            steps = timeline.len(),
            "starting simulation"
        );

        for (step, &ts) in timeline.iter().enumerate() {
            self.step(&mut state, series, step, ts);
        }

        if let Some(&last_ts) = timeline.last() {
            self.force_close(&mut state, series, timeline.len() - 1, last_ts);
        }

        let report = Report::compute(
            &state.trades,
            &state.equity_curve,
            state.initial_capital,
            state.capital,
        );

        info!(
            trades = state.trades.len(),
            final_capital = state.capital,
            "simulation finished"
        );

        SimulationResult {
            initial_capital: state.initial_capital,
            final_capital: state.capital,
            trades: state.trades,
            equity_curve: state.equity_curve,
            report,
        }
    }

    /// Advances `state` by one timeline step.
    pub fn step(
        &self,
        state: &mut SimulationState,
        series: &[BarSeries],
        step: usize,
        ts: NaiveDateTime,
    ) {
        if state.roll_day(ts.date()) {
            debug!(date = %ts.date(), "daily counters reset");
        }
        self.check_exits(state, series, step, ts);
        self.scan_entries(state, series, step, ts);
        state.record_equity(ts);
    }

    fn check_exits(
        &self,
        state: &mut SimulationState,
        series: &[BarSeries],
        step: usize,
        ts: NaiveDateTime,
    ) {
        let max_hold = self.config.exits.max_hold_minutes;
        let exits: Vec<(String, ExitReason, f64)> = state
            .positions
            .values()
            .filter_map(|pos| {
                let bar = find_series(series, pos.symbol())?.get_bar(ts)?;
                let (reason, price) = pos.exit_signal(bar, ts, max_hold, false)?;
                Some((pos.symbol().to_string(), reason, price))
            })
            .collect();

        for (symbol, reason, price) in exits {
            let Some(trade) = state.close_position(&symbol, price, reason, ts, step) else {
                continue;
            };
            let (pnl, pnl_pct) = (trade.pnl, trade.pnl_pct);
            info!(
                symbol = %symbol,
                reason = %reason,
                exit_price = price,
                pnl,
                "position closed"
            );

            let cooldown = &self.config.cooldown;
            if cooldown.enabled {
                let wait = if pnl_pct < 0.0 {
                    cooldown.after_loss
                } else {
                    cooldown.after_exit
                };
                state.cooldowns.block_symbol(&symbol, step + wait);
            }
        }
    }

    fn daily_loss_hit(&self, state: &SimulationState) -> bool {
        let pct = self.config.limits.max_daily_loss_pct;
        pct > 0.0 && state.daily.realized_pnl <= -self.config.capital.amount * pct
    }

    fn entries_blocked(&self, state: &SimulationState, step: usize) -> bool {
        let limits = &self.config.limits;
        let cooldown = &self.config.cooldown;
        state.position_count() >= limits.max_positions
            || state.daily.trades >= limits.max_daily_trades
            || self.daily_loss_hit(state)
            || (cooldown.enabled
                && !state
                    .cooldowns
                    .global_ready(step, cooldown.min_between_trades))
    }

    /// Best setup per eligible symbol, ranked by score (stable on ties).
    fn candidates(
        &self,
        state: &SimulationState,
        series: &[BarSeries],
        step: usize,
        ts: NaiveDateTime,
    ) -> Vec<Setup> {
        let mut candidates = Vec::new();
        for s in series {
            if state.has_position(&s.symbol) {
                continue;
            }
            if self.config.cooldown.enabled && !state.cooldowns.symbol_ready(&s.symbol, step) {
                continue;
            }
            let Some(index) = s.get_bar_index(ts) else {
                continue;
            };
            if index < self.config.limits.min_history_bars {
                continue;
            }
            let history = s.history_through(index);
            if let Some(setup) = best_setup(self.detector.detect(&s.symbol, history, None)) {
                candidates.push(setup);
            }
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    fn scan_entries(
        &self,
        state: &mut SimulationState,
        series: &[BarSeries],
        step: usize,
        ts: NaiveDateTime,
    ) {
        if self.entries_blocked(state, step) {
            return;
        }

        for setup in self.candidates(state, series, step, ts) {
            if self.entries_blocked(state, step) {
                break;
            }
            let info = size_position(&setup, &self.config.capital);
            info!(
                symbol = %setup.symbol,
                setup = setup.type_name(),
                score = setup.score,
                entry = setup.entry,
                stop = setup.stop,
                target = setup.target,
                "position opened"
            );

            let cooldown = &self.config.cooldown;
            if cooldown.enabled {
                state
                    .cooldowns
                    .block_symbol(&setup.symbol, step + cooldown.after_entry);
                state.cooldowns.mark_trade(step);
            }
            state.open_position(OpenPosition {
                setup,
                info,
                entry_time: ts,
                entry_step: step,
                order_ref: None,
            });
        }
    }

    /// Closes every open position at the symbol's last bar not after the
    /// final timestamp. Stop and target still take precedence on that bar.
    fn force_close(
        &self,
        state: &mut SimulationState,
        series: &[BarSeries],
        step: usize,
        last_ts: NaiveDateTime,
    ) {
        let max_hold = self.config.exits.max_hold_minutes;
        let exits: Vec<(String, ExitReason, f64)> = state
            .positions
            .values()
            .map(|pos| {
                let bar = find_series(series, pos.symbol())
                    .and_then(|s| s.last_bar_at_or_before(last_ts));
                match bar.and_then(|b| pos.exit_signal(b, last_ts, max_hold, true)) {
                    Some((reason, price)) => (pos.symbol().to_string(), reason, price),
                    None => (pos.symbol().to_string(), ExitReason::End, pos.entry_price()),
                }
            })
            .collect();

        for (symbol, reason, price) in exits {
            if let Some(trade) = state.close_position(&symbol, price, reason, last_ts, step) {
                info!(symbol = %symbol, reason = %reason, pnl = trade.pnl, "position force-closed");
            }
        }
    }
}

fn find_series<'a>(series: &'a [BarSeries], symbol: &str) -> Option<&'a BarSeries> {
    series.iter().find(|s| s.symbol == symbol)
}
