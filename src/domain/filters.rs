//! Market filters: trend classification and the volatility gate.

use crate::domain::config::{TrendConfig, VolatilityConfig};
use crate::domain::indicator::{calculate_atr, calculate_ema};
use crate::domain::ohlcv::{OhlcvBar, closes};
use crate::domain::setup::{Direction, TrendState};

/// Outcome of the volatility gate, with a human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityCheck {
    pub passed: bool,
    pub reason: String,
}

impl VolatilityCheck {
    fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarketFilters {
    pub trend: TrendConfig,
    pub volatility: VolatilityConfig,
}

impl MarketFilters {
    pub fn new(trend: TrendConfig, volatility: VolatilityConfig) -> Self {
        Self { trend, volatility }
    }

    /// Compares fast and slow EMA of closes. Fewer bars than the slow
    /// period classify as ranging.
    pub fn classify_trend(&self, bars: &[OhlcvBar]) -> TrendState {
        let cfg = &self.trend;
        if bars.len() < cfg.ema_slow {
            return TrendState::Ranging;
        }
        let prices = closes(bars);
        let fast = calculate_ema(&prices, cfg.ema_fast).last_simple();
        let slow = calculate_ema(&prices, cfg.ema_slow).last_simple();
        let (Some(fast), Some(slow)) = (fast, slow) else {
            return TrendState::Ranging;
        };
        if slow == 0.0 {
            return TrendState::Ranging;
        }

        let diff = (fast - slow) / slow;
        if diff.abs() < cfg.ranging_zone_pct {
            TrendState::Ranging
        } else if diff > cfg.threshold_pct {
            TrendState::Uptrend
        } else if diff < -cfg.threshold_pct {
            TrendState::Downtrend
        } else {
            TrendState::Ranging
        }
    }

    /// Always true when the trend filter is disabled.
    pub fn direction_allowed(&self, direction: Direction, trend: TrendState) -> bool {
        if !self.trend.enabled {
            return true;
        }
        self.trend
            .rules
            .get(&trend)
            .is_some_and(|allowed| allowed.contains(&direction))
    }

    /// Requires the current ATR to sit at or above a percentile of its own
    /// recent history, and the last few candles to span a minimum range
    /// relative to the latest close.
    pub fn check_volatility(&self, bars: &[OhlcvBar]) -> VolatilityCheck {
        let cfg = &self.volatility;
        if !cfg.enabled {
            return VolatilityCheck::pass("volatility filter disabled");
        }
        if bars.len() < cfg.atr_lookback {
            return VolatilityCheck::fail("insufficient data for volatility check");
        }

        let atr = calculate_atr(bars, cfg.atr_period);
        let Some(current) = atr.last_simple() else {
            return VolatilityCheck::fail("insufficient ATR data");
        };
        let start = atr.len() - cfg.atr_lookback;
        let below = (start..atr.len())
            .filter_map(|i| atr.simple_at(i))
            .filter(|v| *v < current)
            .count();
        let percentile = below as f64 / cfg.atr_lookback as f64 * 100.0;
        if percentile < cfg.min_atr_percentile {
            return VolatilityCheck::fail(format!(
                "ATR too low (percentile: {:.0}%, need {:.0}%)",
                percentile, cfg.min_atr_percentile
            ));
        }

        let recent = &bars[bars.len().saturating_sub(cfg.recent_candles)..];
        let high = recent.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = recent.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let last_close = bars[bars.len() - 1].close;
        let range_pct = if last_close != 0.0 {
            (high - low) / last_close
        } else {
            0.0
        };
        if range_pct < cfg.min_range_pct {
            return VolatilityCheck::fail(format!(
                "dead market: last {} candles moved only {:.2}%",
                recent.len(),
                range_pct * 100.0
            ));
        }

        VolatilityCheck::pass("volatility check passed")
    }
}
