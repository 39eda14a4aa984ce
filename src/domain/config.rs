//! Typed strategy configuration.
//!
//! Every section has a `Default` matching the stock parameter set. Values
//! are read and validated from a [`ConfigPort`](crate::ports::config_port::ConfigPort)
//! by [`StrategyConfig::from_port`].

use crate::domain::config_validation;
use crate::domain::error::TradesimError;
use crate::domain::setup::{Direction, SetupKind, TrendState};
use crate::ports::config_port::ConfigPort;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CapitalConfig {
    pub amount: f64,
    pub leverage: f64,
    /// Fraction of effective capital committed per position.
    pub position_size_pct: f64,
}

impl CapitalConfig {
    pub fn effective_capital(&self) -> f64 {
        self.amount * self.leverage
    }
}

impl Default for CapitalConfig {
    fn default() -> Self {
        CapitalConfig {
            amount: 1000.0,
            leverage: 5.0,
            position_size_pct: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitsConfig {
    pub max_positions: usize,
    pub max_daily_trades: usize,
    /// Fraction of base capital; 0 disables the daily loss stop.
    pub max_daily_loss_pct: f64,
    /// A symbol is only scanned once its bar index reaches this value.
    pub min_history_bars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_positions: 2,
            max_daily_trades: 12,
            max_daily_loss_pct: 0.30,
            min_history_bars: 55,
        }
    }
}

/// Cooldowns are measured in timeline steps.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownConfig {
    pub enabled: bool,
    pub after_entry: usize,
    pub after_exit: usize,
    pub after_loss: usize,
    pub min_between_trades: usize,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        CooldownConfig {
            enabled: true,
            after_entry: 4,
            after_exit: 2,
            after_loss: 8,
            min_between_trades: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Stop anchored beyond the slow EMA, target a fixed percentage away.
    Percentage,
    /// Stop and target at ATR multiples from entry.
    Atr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitConfig {
    pub max_hold_minutes: i64,
    pub stop_mode: StopMode,
    pub atr_period: usize,
    pub atr_stop_mult: f64,
    pub atr_target_mult: f64,
    pub ema_stop_buffer_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        ExitConfig {
            max_hold_minutes: 120,
            stop_mode: StopMode::Percentage,
            atr_period: 14,
            atr_stop_mult: 1.5,
            atr_target_mult: 2.25,
            ema_stop_buffer_pct: 0.005,
            take_profit_pct: 0.015,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetupToggle {
    pub enabled: bool,
    /// Base score assigned to setups of this kind.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetupConfig {
    pub min_score: f64,
    pub toggles: BTreeMap<SetupKind, SetupToggle>,
    pub ema_pullback_rsi_confirm: bool,
    pub rsi_confirm_low: f64,
    pub rsi_confirm_high: f64,
}

impl SetupConfig {
    pub fn default_score(kind: SetupKind) -> f64 {
        match kind {
            SetupKind::EmaPullback => 0.6,
            SetupKind::Breakout => 0.55,
            SetupKind::OscillatorExtreme => 0.5,
            SetupKind::RangeBounce => 0.45,
            SetupKind::Momentum => 0.45,
        }
    }

    pub fn toggle(&self, kind: SetupKind) -> SetupToggle {
        self.toggles.get(&kind).copied().unwrap_or(SetupToggle {
            enabled: false,
            score: 0.0,
        })
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        let toggles = SetupKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    SetupToggle {
                        enabled: true,
                        score: SetupConfig::default_score(kind),
                    },
                )
            })
            .collect();
        SetupConfig {
            min_score: 0.4,
            toggles,
            ema_pullback_rsi_confirm: false,
            rsi_confirm_low: 40.0,
            rsi_confirm_high: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub enabled: bool,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub threshold_pct: f64,
    pub ranging_zone_pct: f64,
    pub rules: BTreeMap<TrendState, Vec<Direction>>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        let rules = BTreeMap::from([
            (TrendState::Uptrend, vec![Direction::Long]),
            (TrendState::Downtrend, vec![Direction::Short]),
            (TrendState::Ranging, vec![Direction::Long, Direction::Short]),
        ]);
        TrendConfig {
            enabled: true,
            ema_fast: 21,
            ema_slow: 55,
            threshold_pct: 0.005,
            ranging_zone_pct: 0.002,
            rules,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityConfig {
    pub enabled: bool,
    pub atr_period: usize,
    pub atr_lookback: usize,
    pub min_atr_percentile: f64,
    pub recent_candles: usize,
    pub min_range_pct: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        VolatilityConfig {
            enabled: true,
            atr_period: 14,
            atr_lookback: 50,
            min_atr_percentile: 20.0,
            recent_candles: 4,
            min_range_pct: 0.003,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyConfig {
    pub capital: CapitalConfig,
    pub limits: LimitsConfig,
    pub cooldown: CooldownConfig,
    pub exits: ExitConfig,
    pub setups: SetupConfig,
    pub trend: TrendConfig,
    pub volatility: VolatilityConfig,
}

impl StrategyConfig {
    /// Reads every section from `config`, falling back to defaults for
    /// absent keys and rejecting malformed or out-of-range values.
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TradesimError> {
        let strategy = StrategyConfig {
            capital: config_validation::read_capital(config)?,
            limits: config_validation::read_limits(config)?,
            cooldown: config_validation::read_cooldown(config)?,
            exits: config_validation::read_exits(config)?,
            setups: config_validation::read_setups(config)?,
            trend: config_validation::read_trend(config)?,
            volatility: config_validation::read_volatility(config)?,
        };
        Ok(strategy)
    }
}
