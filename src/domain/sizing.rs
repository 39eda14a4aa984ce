//! Fixed-fraction position sizing on leveraged capital.

use crate::domain::config::CapitalConfig;
use crate::domain::setup::{Direction, Setup};

#[derive(Debug, Clone, PartialEq)]
pub struct PositionInfo {
    pub size_in_currency: f64,
    pub size_in_units: f64,
    pub risk_in_currency: f64,
    /// Adverse move from entry to stop, as a fraction of entry.
    pub risk_pct: f64,
    pub reward_in_currency: f64,
    /// Favourable move from entry to target, as a fraction of entry.
    pub reward_pct: f64,
    pub risk_reward_ratio: f64,
    /// Currency risk relative to base (unleveraged) capital.
    pub risk_of_capital_pct: f64,
}

pub fn size_position(setup: &Setup, capital: &CapitalConfig) -> PositionInfo {
    let size_in_currency = capital.effective_capital() * capital.position_size_pct;
    let entry = setup.entry;

    let (risk_pct, reward_pct, size_in_units) = if entry > 0.0 {
        let (risk, reward) = match setup.direction {
            Direction::Long => (entry - setup.stop, setup.target - entry),
            Direction::Short => (setup.stop - entry, entry - setup.target),
        };
        (risk / entry, reward / entry, size_in_currency / entry)
    } else {
        (0.0, 0.0, 0.0)
    };

    let risk_in_currency = size_in_currency * risk_pct;
    let reward_in_currency = size_in_currency * reward_pct;
    let risk_reward_ratio = if risk_pct > 0.0 {
        reward_pct / risk_pct
    } else {
        0.0
    };
    let risk_of_capital_pct = if capital.amount > 0.0 {
        risk_in_currency / capital.amount
    } else {
        0.0
    };

    PositionInfo {
        size_in_currency,
        size_in_units,
        risk_in_currency,
        risk_pct,
        reward_in_currency,
        reward_pct,
        risk_reward_ratio,
        risk_of_capital_pct,
    }
}
