//! Configuration reading and validation.
//!
//! Each `read_*` function pulls one section from a [`ConfigPort`], applies
//! the defaults for absent keys and rejects malformed or out-of-range values
//! with [`TradesimError::ConfigInvalid`].

use crate::domain::bar_series::DateRange;
use crate::domain::config::{
    CapitalConfig, CooldownConfig, ExitConfig, LimitsConfig, SetupConfig, SetupToggle, StopMode,
    StrategyConfig, TrendConfig, VolatilityConfig,
};
use crate::domain::error::TradesimError;
use crate::domain::setup::{Direction, SetupKind, TrendState};
use crate::ports::config_port::{ConfigPort, parse_flag};
use chrono::{NaiveDate, NaiveDateTime};

/// Full validation pass used by the `validate` command and before a run.
pub fn validate_config(config: &dyn ConfigPort) -> Result<StrategyConfig, TradesimError> {
    let strategy = StrategyConfig::from_port(config)?;
    read_date_range(config)?;
    Ok(strategy)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn ensure(ok: bool, section: &str, key: &str, reason: &str) -> Result<(), TradesimError> {
    if ok {
        Ok(())
    } else {
        Err(invalid(section, key, reason))
    }
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradesimError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(section, key, format!("expected a number, got '{}'", raw))),
        },
    }
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TradesimError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            invalid(
                section,
                key,
                format!("expected a non-negative integer, got '{}'", raw),
            )
        }),
    }
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, TradesimError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => parse_flag(&raw)
            .ok_or_else(|| invalid(section, key, format!("expected a boolean, got '{}'", raw))),
    }
}

pub fn read_capital(config: &dyn ConfigPort) -> Result<CapitalConfig, TradesimError> {
    let d = CapitalConfig::default();
    let capital = CapitalConfig {
        amount: read_f64(config, "capital", "amount", d.amount)?,
        leverage: read_f64(config, "capital", "leverage", d.leverage)?,
        position_size_pct: read_f64(config, "capital", "position_size_pct", d.position_size_pct)?,
    };
    ensure(capital.amount > 0.0, "capital", "amount", "amount must be positive")?;
    ensure(
        capital.leverage > 0.0,
        "capital",
        "leverage",
        "leverage must be positive",
    )?;
    ensure(
        capital.position_size_pct > 0.0 && capital.position_size_pct <= 1.0,
        "capital",
        "position_size_pct",
        "position_size_pct must be in (0, 1]",
    )?;
    Ok(capital)
}

pub fn read_limits(config: &dyn ConfigPort) -> Result<LimitsConfig, TradesimError> {
    let d = LimitsConfig::default();
    let limits = LimitsConfig {
        max_positions: read_usize(config, "limits", "max_positions", d.max_positions)?,
        max_daily_trades: read_usize(config, "limits", "max_daily_trades", d.max_daily_trades)?,
        max_daily_loss_pct: read_f64(config, "limits", "max_daily_loss_pct", d.max_daily_loss_pct)?,
        min_history_bars: read_usize(config, "limits", "min_history_bars", d.min_history_bars)?,
    };
    ensure(
        limits.max_positions >= 1,
        "limits",
        "max_positions",
        "max_positions must be at least 1",
    )?;
    ensure(
        limits.max_daily_trades >= 1,
        "limits",
        "max_daily_trades",
        "max_daily_trades must be at least 1",
    )?;
    ensure(
        (0.0..=1.0).contains(&limits.max_daily_loss_pct),
        "limits",
        "max_daily_loss_pct",
        "max_daily_loss_pct must be between 0 and 1",
    )?;
    Ok(limits)
}

pub fn read_cooldown(config: &dyn ConfigPort) -> Result<CooldownConfig, TradesimError> {
    let d = CooldownConfig::default();
    Ok(CooldownConfig {
        enabled: read_bool(config, "cooldown", "enabled", d.enabled)?,
        after_entry: read_usize(config, "cooldown", "after_entry", d.after_entry)?,
        after_exit: read_usize(config, "cooldown", "after_exit", d.after_exit)?,
        after_loss: read_usize(config, "cooldown", "after_loss", d.after_loss)?,
        min_between_trades: read_usize(
            config,
            "cooldown",
            "min_between_trades",
            d.min_between_trades,
        )?,
    })
}

pub fn read_exits(config: &dyn ConfigPort) -> Result<ExitConfig, TradesimError> {
    let d = ExitConfig::default();
    let use_atr = read_bool(config, "exits", "use_atr_stops", false)?;
    let max_hold = read_usize(config, "exits", "max_hold_minutes", d.max_hold_minutes as usize)?;

    for key in ["breakeven_enabled", "partial_tp_enabled"] {
        if read_bool(config, "exits", key, false)? {
            return Err(invalid("exits", key, format!("{} is not supported", key)));
        }
    }

    let exits = ExitConfig {
        max_hold_minutes: i64::try_from(max_hold)
            .map_err(|_| invalid("exits", "max_hold_minutes", "max_hold_minutes is too large"))?,
        stop_mode: if use_atr {
            StopMode::Atr
        } else {
            StopMode::Percentage
        },
        atr_period: read_usize(config, "exits", "atr_period", d.atr_period)?,
        atr_stop_mult: read_f64(config, "exits", "atr_stop_mult", d.atr_stop_mult)?,
        atr_target_mult: read_f64(config, "exits", "atr_target_mult", d.atr_target_mult)?,
        ema_stop_buffer_pct: read_f64(config, "exits", "ema_stop_buffer_pct", d.ema_stop_buffer_pct)?,
        take_profit_pct: read_f64(config, "exits", "take_profit_pct", d.take_profit_pct)?,
    };
    ensure(
        exits.max_hold_minutes > 0,
        "exits",
        "max_hold_minutes",
        "max_hold_minutes must be positive",
    )?;
    ensure(
        exits.atr_period >= 1,
        "exits",
        "atr_period",
        "atr_period must be at least 1",
    )?;
    ensure(
        exits.atr_stop_mult > 0.0,
        "exits",
        "atr_stop_mult",
        "atr_stop_mult must be positive",
    )?;
    ensure(
        exits.atr_target_mult > 0.0,
        "exits",
        "atr_target_mult",
        "atr_target_mult must be positive",
    )?;
    ensure(
        exits.ema_stop_buffer_pct >= 0.0,
        "exits",
        "ema_stop_buffer_pct",
        "ema_stop_buffer_pct must be non-negative",
    )?;
    ensure(
        exits.take_profit_pct > 0.0,
        "exits",
        "take_profit_pct",
        "take_profit_pct must be positive",
    )?;
    Ok(exits)
}

const SETUP_OPTION_KEYS: [&str; 4] = [
    "min_score",
    "ema_pullback_rsi_confirm",
    "rsi_confirm_low",
    "rsi_confirm_high",
];

fn is_known_setup_key(key: &str) -> bool {
    if SETUP_OPTION_KEYS.contains(&key) {
        return true;
    }
    let base = key.strip_suffix("_score").unwrap_or(key);
    SetupKind::from_config_key(base).is_some()
}

pub fn read_setups(config: &dyn ConfigPort) -> Result<SetupConfig, TradesimError> {
    for key in config.keys("setups") {
        if !is_known_setup_key(&key) {
            return Err(invalid("setups", &key, "unknown setup entry"));
        }
    }

    let d = SetupConfig::default();
    let mut toggles = d.toggles.clone();
    for kind in SetupKind::ALL {
        let key = kind.config_key();
        let score_key = format!("{}_score", key);
        let toggle = SetupToggle {
            enabled: read_bool(config, "setups", key, true)?,
            score: read_f64(config, "setups", &score_key, SetupConfig::default_score(kind))?,
        };
        ensure(
            (0.0..=1.0).contains(&toggle.score),
            "setups",
            &score_key,
            "score must be between 0 and 1",
        )?;
        toggles.insert(kind, toggle);
    }

    let setups = SetupConfig {
        min_score: read_f64(config, "setups", "min_score", d.min_score)?,
        toggles,
        ema_pullback_rsi_confirm: read_bool(
            config,
            "setups",
            "ema_pullback_rsi_confirm",
            d.ema_pullback_rsi_confirm,
        )?,
        rsi_confirm_low: read_f64(config, "setups", "rsi_confirm_low", d.rsi_confirm_low)?,
        rsi_confirm_high: read_f64(config, "setups", "rsi_confirm_high", d.rsi_confirm_high)?,
    };
    ensure(
        (0.0..=1.0).contains(&setups.min_score),
        "setups",
        "min_score",
        "min_score must be between 0 and 1",
    )?;
    ensure(
        setups.rsi_confirm_low <= setups.rsi_confirm_high,
        "setups",
        "rsi_confirm_low",
        "rsi_confirm_low must not exceed rsi_confirm_high",
    )?;
    Ok(setups)
}

fn parse_directions(raw: &str, key: &str) -> Result<Vec<Direction>, TradesimError> {
    let mut directions = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let direction = Direction::parse(token)
            .ok_or_else(|| invalid("trend", key, format!("unknown direction '{}'", token)))?;
        if !directions.contains(&direction) {
            directions.push(direction);
        }
    }
    Ok(directions)
}

pub fn read_trend(config: &dyn ConfigPort) -> Result<TrendConfig, TradesimError> {
    let d = TrendConfig::default();
    let mut rules = d.rules.clone();
    for state in TrendState::ALL {
        if let Some(raw) = config.get_string("trend", state.as_str()) {
            rules.insert(state, parse_directions(&raw, state.as_str())?);
        }
    }

    let trend = TrendConfig {
        enabled: read_bool(config, "trend", "enabled", d.enabled)?,
        ema_fast: read_usize(config, "trend", "ema_fast", d.ema_fast)?,
        ema_slow: read_usize(config, "trend", "ema_slow", d.ema_slow)?,
        threshold_pct: read_f64(config, "trend", "threshold_pct", d.threshold_pct)?,
        ranging_zone_pct: read_f64(config, "trend", "ranging_zone_pct", d.ranging_zone_pct)?,
        rules,
    };
    ensure(
        trend.ema_fast >= 1,
        "trend",
        "ema_fast",
        "ema_fast must be at least 1",
    )?;
    ensure(
        trend.ema_fast < trend.ema_slow,
        "trend",
        "ema_slow",
        "ema_slow must be greater than ema_fast",
    )?;
    ensure(
        trend.ranging_zone_pct >= 0.0,
        "trend",
        "ranging_zone_pct",
        "ranging_zone_pct must be non-negative",
    )?;
    ensure(
        trend.threshold_pct >= trend.ranging_zone_pct,
        "trend",
        "threshold_pct",
        "threshold_pct must be at least ranging_zone_pct",
    )?;
    Ok(trend)
}

pub fn read_volatility(config: &dyn ConfigPort) -> Result<VolatilityConfig, TradesimError> {
    let d = VolatilityConfig::default();
    let volatility = VolatilityConfig {
        enabled: read_bool(config, "volatility", "enabled", d.enabled)?,
        atr_period: read_usize(config, "volatility", "atr_period", d.atr_period)?,
        atr_lookback: read_usize(config, "volatility", "atr_lookback", d.atr_lookback)?,
        min_atr_percentile: read_f64(
            config,
            "volatility",
            "min_atr_percentile",
            d.min_atr_percentile,
        )?,
        recent_candles: read_usize(config, "volatility", "recent_candles", d.recent_candles)?,
        min_range_pct: read_f64(config, "volatility", "min_range_pct", d.min_range_pct)?,
    };
    ensure(
        volatility.atr_period >= 1,
        "volatility",
        "atr_period",
        "atr_period must be at least 1",
    )?;
    ensure(
        volatility.atr_lookback >= 1,
        "volatility",
        "atr_lookback",
        "atr_lookback must be at least 1",
    )?;
    ensure(
        (0.0..=100.0).contains(&volatility.min_atr_percentile),
        "volatility",
        "min_atr_percentile",
        "min_atr_percentile must be between 0 and 100",
    )?;
    ensure(
        volatility.recent_candles >= 1,
        "volatility",
        "recent_candles",
        "recent_candles must be at least 1",
    )?;
    ensure(
        volatility.min_range_pct >= 0.0,
        "volatility",
        "min_range_pct",
        "min_range_pct must be non-negative",
    )?;
    Ok(volatility)
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`.
/// A bare date at the end of a range covers the whole day.
fn parse_bound(raw: &str, key: &str, end_of_day: bool) -> Result<NaiveDateTime, TradesimError> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        invalid(
            "backtest",
            key,
            format!("invalid {} format, expected YYYY-MM-DD[ HH:MM:SS]", key),
        )
    })?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.ok_or_else(|| invalid("backtest", key, "invalid time of day"))
}

pub fn read_date_range(config: &dyn ConfigPort) -> Result<DateRange, TradesimError> {
    let start = config
        .get_string("backtest", "start")
        .map(|raw| parse_bound(&raw, "start", false))
        .transpose()?;
    let end = config
        .get_string("backtest", "end")
        .map(|raw| parse_bound(&raw, "end", true))
        .transpose()?;
    if let (Some(s), Some(e)) = (start, end) {
        ensure(s <= e, "backtest", "start", "start must not be after end")?;
    }
    Ok(DateRange::new(start, end))
}
