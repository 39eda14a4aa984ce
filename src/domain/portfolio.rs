//! Simulation state: capital, open positions, cooldowns, daily counters,
//! closed trades and the equity curve.

use crate::domain::position::{ExitReason, OpenPosition, TradeRecord};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub capital: f64,
    pub open_positions: usize,
}

/// Step-indexed cooldowns. A symbol may enter again once the step reaches
/// its recorded `available_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cooldowns {
    available_at: HashMap<String, usize>,
    last_trade_step: Option<usize>,
}

impl Cooldowns {
    pub fn symbol_ready(&self, symbol: &str, step: usize) -> bool {
        self.available_at
            .get(symbol)
            .is_none_or(|&available| step >= available)
    }

    pub fn global_ready(&self, step: usize, min_between_trades: usize) -> bool {
        self.last_trade_step
            .is_none_or(|last| step >= last + min_between_trades)
    }

    pub fn block_symbol(&mut self, symbol: &str, until_step: usize) {
        self.available_at.insert(symbol.to_string(), until_step);
    }

    pub fn mark_trade(&mut self, step: usize) {
        self.last_trade_step = Some(step);
    }

    pub fn last_trade_step(&self) -> Option<usize> {
        self.last_trade_step
    }
}

/// Per-calendar-day counters, reset when the date changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyCounters {
    pub date: Option<NaiveDate>,
    pub trades: usize,
    pub realized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub initial_capital: f64,
    pub capital: f64,
    /// Keyed by symbol; at most one open position per symbol.
    pub positions: BTreeMap<String, OpenPosition>,
    pub cooldowns: Cooldowns,
    pub daily: DailyCounters,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
}

impl SimulationState {
    pub fn new(initial_capital: f64) -> Self {
        SimulationState {
            initial_capital,
            capital: initial_capital,
            positions: BTreeMap::new(),
            cooldowns: Cooldowns::default(),
            daily: DailyCounters::default(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Resets the daily counters when `date` differs from the tracked day.
    /// Returns true on a reset.
    pub fn roll_day(&mut self, date: NaiveDate) -> bool {
        if self.daily.date == Some(date) {
            return false;
        }
        self.daily = DailyCounters {
            date: Some(date),
            trades: 0,
            realized_pnl: 0.0,
        };
        true
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn open_position(&mut self, position: OpenPosition) {
        self.daily.trades += 1;
        self.positions
            .insert(position.symbol().to_string(), position);
    }

    /// Closes the symbol's position, credits its P&L and records the trade.
    pub fn close_position(
        &mut self,
        symbol: &str,
        exit_price: f64,
        reason: ExitReason,
        exit_time: NaiveDateTime,
        exit_step: usize,
    ) -> Option<&TradeRecord> {
        let position = self.positions.remove(symbol)?;
        let trade = position.close(exit_price, reason, exit_time, exit_step);
        self.capital += trade.pnl;
        self.daily.realized_pnl += trade.pnl;
        self.trades.push(trade);
        self.trades.last()
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime) {
        self.equity_curve.push(EquityPoint {
            timestamp,
            capital: self.capital,
            open_positions: self.positions.len(),
        });
    }
}
