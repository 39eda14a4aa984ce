//! Open positions, exit rules and closed trade records.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::setup::{Direction, Setup};
use crate::domain::sizing::PositionInfo;
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Time,
    End,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "TP",
            ExitReason::StopLoss => "STOP",
            ExitReason::Time => "TIME",
            ExitReason::End => "END",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub setup: Setup,
    pub info: PositionInfo,
    pub entry_time: NaiveDateTime,
    pub entry_step: usize,
    /// Broker order reference; always `None` in simulation.
    pub order_ref: Option<String>,
}

impl OpenPosition {
    pub fn symbol(&self) -> &str {
        &self.setup.symbol
    }

    pub fn direction(&self) -> Direction {
        self.setup.direction
    }

    pub fn entry_price(&self) -> f64 {
        self.setup.entry
    }

    pub fn should_stop_loss(&self, bar: &OhlcvBar) -> bool {
        match self.direction() {
            Direction::Long => bar.low <= self.setup.stop,
            Direction::Short => bar.high >= self.setup.stop,
        }
    }

    pub fn should_take_profit(&self, bar: &OhlcvBar) -> bool {
        match self.direction() {
            Direction::Long => bar.high >= self.setup.target,
            Direction::Short => bar.low <= self.setup.target,
        }
    }

    /// True once the position has been held strictly longer than
    /// `max_hold_minutes`, to the second.
    pub fn held_too_long(&self, now: NaiveDateTime, max_hold_minutes: i64) -> bool {
        (now - self.entry_time).num_seconds() > max_hold_minutes * 60
    }

    /// Exit decision for `bar` at `now`. Stop is checked before target, so a
    /// bar touching both exits at the stop. `force` closes at the bar's
    /// close when nothing else triggers.
    pub fn exit_signal(
        &self,
        bar: &OhlcvBar,
        now: NaiveDateTime,
        max_hold_minutes: i64,
        force: bool,
    ) -> Option<(ExitReason, f64)> {
        if self.should_stop_loss(bar) {
            Some((ExitReason::StopLoss, self.setup.stop))
        } else if self.should_take_profit(bar) {
            Some((ExitReason::TakeProfit, self.setup.target))
        } else if self.held_too_long(now, max_hold_minutes) {
            Some((ExitReason::Time, bar.close))
        } else if force {
            Some((ExitReason::End, bar.close))
        } else {
            None
        }
    }

    /// Directional return from entry to `exit_price`.
    pub fn return_pct(&self, exit_price: f64) -> f64 {
        let entry = self.entry_price();
        if entry == 0.0 {
            return 0.0;
        }
        self.direction().sign() * (exit_price - entry) / entry
    }

    pub fn close(
        self,
        exit_price: f64,
        exit_reason: ExitReason,
        exit_time: NaiveDateTime,
        exit_step: usize,
    ) -> TradeRecord {
        let pnl_pct = self.return_pct(exit_price);
        let pnl = self.info.size_in_currency * pnl_pct;
        TradeRecord {
            symbol: self.setup.symbol.clone(),
            setup_type: self.setup.type_name().to_string(),
            direction: self.setup.direction,
            score: self.setup.score,
            entry_time: self.entry_time,
            entry_step: self.entry_step,
            entry_price: self.setup.entry,
            stop: self.setup.stop,
            target: self.setup.target,
            exit_time,
            exit_step,
            exit_price,
            exit_reason,
            size_in_currency: self.info.size_in_currency,
            pnl,
            pnl_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub setup_type: String,
    pub direction: Direction,
    pub score: f64,
    pub entry_time: NaiveDateTime,
    pub entry_step: usize,
    pub entry_price: f64,
    pub stop: f64,
    pub target: f64,
    pub exit_time: NaiveDateTime,
    pub exit_step: usize,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub size_in_currency: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
}

impl TradeRecord {
    pub fn duration_minutes(&self) -> f64 {
        (self.exit_time - self.entry_time).num_seconds() as f64 / 60.0
    }

    pub fn is_winner(&self) -> bool {
        self.pnl_pct > 0.0
    }
}
