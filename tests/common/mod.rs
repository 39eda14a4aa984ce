#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use tradesim::domain::bar_series::{BarSeries, DateRange};
use tradesim::domain::config::StrategyConfig;
use tradesim::domain::detector::SetupDetector;
use tradesim::domain::error::{EvaluatorError, TradesimError};
use tradesim::domain::evaluators::{Candidate, EvaluationContext, Evaluator, EvaluatorFn};
pub use tradesim::domain::ohlcv::OhlcvBar;
use tradesim::domain::setup::{Direction, SetupKind};
use tradesim::domain::simulation::{SimulationResult, Simulator};
use tradesim::ports::data_port::DataPort;
use tradesim::ports::report_port::ReportPort;

/// Volume value that arms [`long_on_marker`].
pub const MARKER_VOLUME: f64 = 777.0;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str, range: &DateRange) -> Result<Vec<OhlcvBar>, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::DataLoad {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| range.contains(b.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Captures results instead of writing files.
pub struct RecordingReport {
    pub results: RefCell<Vec<SimulationResult>>,
}

impl RecordingReport {
    pub fn new() -> Self {
        Self {
            results: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for RecordingReport {
    fn render(&self, result: &SimulationResult) -> String {
        format!("{} trades", result.trades.len())
    }

    fn write(&self, result: &SimulationResult, _output_path: &Path) -> Result<(), TradesimError> {
        self.results.borrow_mut().push(result.clone());
        Ok(())
    }
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Timestamp of a 5-minute bar.
pub fn ts(step: usize) -> NaiveDateTime {
    base_time() + Duration::minutes(5 * step as i64)
}

pub fn make_bar(symbol: &str, timestamp: NaiveDateTime, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        timestamp,
        open: close,
        high: close * 1.001,
        low: close * 0.999,
        close,
        volume: 1000.0,
    }
}

/// 5-minute bars, one per close.
pub fn make_bars(symbol: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(symbol, ts(i), c))
        .collect()
}

pub fn make_series(symbol: &str, closes: &[f64]) -> BarSeries {
    BarSeries::new(symbol, make_bars(symbol, closes))
}

/// Hourly bars starting at `start`.
pub fn hourly_series(symbol: &str, start: NaiveDateTime, closes: &[f64]) -> BarSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(symbol, start + Duration::hours(i as i64), c))
        .collect();
    BarSeries::new(symbol, bars)
}

/// Prices from compounding `returns` onto 100.
pub fn random_walk(returns: &[f64]) -> Vec<f64> {
    let mut price = 100.0;
    returns
        .iter()
        .map(|r| {
            price *= 1.0 + r;
            price
        })
        .collect()
}

/// Stock parameters with both market filters off and no warm-up.
pub fn unfiltered_config() -> StrategyConfig {
    let mut config = StrategyConfig::default();
    config.trend.enabled = false;
    config.volatility.enabled = false;
    config.limits.min_history_bars = 0;
    config
}

/// Long at the close with a 1% stop and 2% target, on every bar.
pub fn always_long(ctx: &EvaluationContext<'_>) -> Result<Option<Candidate>, EvaluatorError> {
    let Some(bar) = ctx.bars.last() else {
        return Ok(None);
    };
    Ok(Some(Candidate {
        direction: Direction::Long,
        entry: bar.close,
        stop: bar.close * 0.99,
        target: bar.close * 1.02,
        reason: "always".into(),
    }))
}

/// Like [`always_long`], but only on bars whose volume is [`MARKER_VOLUME`].
pub fn long_on_marker(ctx: &EvaluationContext<'_>) -> Result<Option<Candidate>, EvaluatorError> {
    match ctx.bars.last() {
        Some(bar) if bar.volume == MARKER_VOLUME => always_long(ctx),
        _ => Ok(None),
    }
}

pub fn stub(kind: SetupKind, evaluate: EvaluatorFn) -> Evaluator {
    Evaluator { kind, evaluate }
}

pub fn same_exit_code(a: std::process::ExitCode, b: std::process::ExitCode) -> bool {
    format!("{:?}", a) == format!("{:?}", b)
}

pub fn stub_simulator(config: StrategyConfig, evaluators: Vec<Evaluator>) -> Simulator {
    let detector = SetupDetector::new(&config).with_evaluators(evaluators);
    Simulator::with_detector(config, detector)
}
