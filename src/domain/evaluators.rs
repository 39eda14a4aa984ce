//! Setup evaluators.
//!
//! Each evaluator inspects the latest bar of a history window and returns at
//! most one [`Candidate`]. Insufficient history is `Ok(None)`; an indicator
//! that is undefined or non-finite despite enough history is an
//! [`EvaluatorError`].

use crate::domain::config::{ExitConfig, SetupConfig, StopMode};
use crate::domain::error::EvaluatorError;
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorValue, calculate_atr, calculate_bollinger,
    calculate_ema, calculate_rsi, rolling_max, rolling_min,
};
use crate::domain::ohlcv::{OhlcvBar, closes, highs, lows};
use crate::domain::setup::{Direction, SetupKind};

const PULLBACK_FAST: usize = 21;
const PULLBACK_SLOW: usize = 55;
const PULLBACK_BAND_NEAR: f64 = 0.005;
const PULLBACK_BAND_FAR: f64 = 0.01;

const BREAKOUT_LOOKBACK: usize = 20;
const BREAKOUT_STOP_PCT: f64 = 0.01;
const BREAKOUT_TARGET_PCT: f64 = 0.02;

const RSI_PERIOD: usize = 14;
const RSI_MIN_BARS: usize = 20;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_SWING_BARS: usize = 5;
const RSI_STOP_PCT: f64 = 0.005;
const RSI_TARGET_PCT: f64 = 0.012;

const BAND_PERIOD: usize = 20;
const BAND_STDDEV: f64 = 2.0;
const BAND_WIDTH_LOOKBACK: usize = 50;
const BAND_PROXIMITY: f64 = 0.005;
const BAND_STOP_PCT: f64 = 0.01;

const MOMENTUM_BARS: usize = 3;
const MOMENTUM_THRESHOLD: f64 = 0.02;
const MOMENTUM_STOP_PCT: f64 = 0.015;
const MOMENTUM_TARGET_PCT: f64 = 0.015;

/// Price levels proposed by an evaluator. The detector attaches kind,
/// score, symbol and trend.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub reason: String,
}

/// Column views over a history window, shared by all evaluators.
pub struct EvaluationContext<'a> {
    pub bars: &'a [OhlcvBar],
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub setups: &'a SetupConfig,
    pub exits: &'a ExitConfig,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(bars: &'a [OhlcvBar], setups: &'a SetupConfig, exits: &'a ExitConfig) -> Self {
        Self {
            bars,
            closes: closes(bars),
            highs: highs(bars),
            lows: lows(bars),
            setups,
            exits,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Latest close, which every evaluator uses as the entry price.
    fn price(&self, kind: SetupKind) -> Result<f64, EvaluatorError> {
        let price = self.closes.last().copied().unwrap_or(f64::NAN);
        if price.is_finite() {
            Ok(price)
        } else {
            Err(EvaluatorError::NonFinite {
                kind,
                indicator: "close".to_string(),
                value: price,
            })
        }
    }
}

pub type EvaluatorFn = fn(&EvaluationContext<'_>) -> Result<Option<Candidate>, EvaluatorError>;

#[derive(Clone, Copy)]
pub struct Evaluator {
    pub kind: SetupKind,
    pub evaluate: EvaluatorFn,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator").field("kind", &self.kind).finish()
    }
}

/// Evaluators in their default order.
pub fn default_evaluators() -> Vec<Evaluator> {
    vec![
        Evaluator {
            kind: SetupKind::EmaPullback,
            evaluate: ema_pullback,
        },
        Evaluator {
            kind: SetupKind::Breakout,
            evaluate: breakout,
        },
        Evaluator {
            kind: SetupKind::OscillatorExtreme,
            evaluate: oscillator_extreme,
        },
        Evaluator {
            kind: SetupKind::RangeBounce,
            evaluate: range_bounce,
        },
        Evaluator {
            kind: SetupKind::Momentum,
            evaluate: momentum,
        },
    ]
}

fn latest(kind: SetupKind, series: &IndicatorSeries) -> Result<f64, EvaluatorError> {
    let indicator = series.indicator_type.to_string();
    match series.values.last() {
        Some(IndicatorPoint {
            valid: true,
            value: IndicatorValue::Simple(v),
        }) => Ok(*v),
        Some(IndicatorPoint {
            value: IndicatorValue::Simple(v),
            ..
        }) if !v.is_finite() => Err(EvaluatorError::NonFinite {
            kind,
            indicator,
            value: *v,
        }),
        _ => Err(EvaluatorError::UndefinedIndicator { kind, indicator }),
    }
}

pub fn ema_pullback(ctx: &EvaluationContext<'_>) -> Result<Option<Candidate>, EvaluatorError> {
    let kind = SetupKind::EmaPullback;
    if ctx.len() < PULLBACK_SLOW {
        return Ok(None);
    }
    let price = ctx.price(kind)?;
    let fast = latest(kind, &calculate_ema(&ctx.closes, PULLBACK_FAST))?;
    let slow = latest(kind, &calculate_ema(&ctx.closes, PULLBACK_SLOW))?;
    if fast == 0.0 {
        return Ok(None);
    }
    let distance = (price - fast) / fast;

    let direction = if fast > slow && -PULLBACK_BAND_FAR < distance && distance < PULLBACK_BAND_NEAR
    {
        Direction::Long
    } else if fast < slow && -PULLBACK_BAND_NEAR < distance && distance < PULLBACK_BAND_FAR {
        Direction::Short
    } else {
        return Ok(None);
    };

    if ctx.setups.ema_pullback_rsi_confirm {
        let rsi = latest(kind, &calculate_rsi(&ctx.closes, RSI_PERIOD))?;
        if rsi < ctx.setups.rsi_confirm_low || rsi > ctx.setups.rsi_confirm_high {
            return Ok(None);
        }
    }

    let sign = direction.sign();
    let (stop, target) = match ctx.exits.stop_mode {
        StopMode::Percentage => (
            slow * (1.0 - sign * ctx.exits.ema_stop_buffer_pct),
            price * (1.0 + sign * ctx.exits.take_profit_pct),
        ),
        StopMode::Atr => {
            let atr = latest(kind, &calculate_atr(ctx.bars, ctx.exits.atr_period))?;
            (
                price - sign * atr * ctx.exits.atr_stop_mult,
                price + sign * atr * ctx.exits.atr_target_mult,
            )
        }
    };

    let side = match direction {
        Direction::Long => "uptrend",
        Direction::Short => "downtrend",
    };
    Ok(Some(Candidate {
        direction,
        entry: price,
        stop,
        target,
        reason: format!(
            "pullback to EMA{} in {} ({:+.2}% from EMA)",
            PULLBACK_FAST,
            side,
            distance * 100.0
        ),
    }))
}

pub fn breakout(ctx: &EvaluationContext<'_>) -> Result<Option<Candidate>, EvaluatorError> {
    let kind = SetupKind::Breakout;
    if ctx.len() < BREAKOUT_LOOKBACK + 1 {
        return Ok(None);
    }
    let price = ctx.price(kind)?;
    let prior_high = latest(kind, &rolling_max(&ctx.highs, BREAKOUT_LOOKBACK, false))?;
    let prior_low = latest(kind, &rolling_min(&ctx.lows, BREAKOUT_LOOKBACK, false))?;

    if price > prior_high {
        return Ok(Some(Candidate {
            direction: Direction::Long,
            entry: price,
            stop: prior_high * (1.0 - BREAKOUT_STOP_PCT),
            target: price * (1.0 + BREAKOUT_TARGET_PCT),
            reason: format!(
                "breakout above {}-bar high {:.4}",
                BREAKOUT_LOOKBACK, prior_high
            ),
        }));
    }
    if price < prior_low {
        return Ok(Some(Candidate {
            direction: Direction::Short,
            entry: price,
            stop: prior_low * (1.0 + BREAKOUT_STOP_PCT),
            target: price * (1.0 - BREAKOUT_TARGET_PCT),
            reason: format!(
                "breakdown below {}-bar low {:.4}",
                BREAKOUT_LOOKBACK, prior_low
            ),
        }));
    }
    Ok(None)
}

pub fn oscillator_extreme(
    ctx: &EvaluationContext<'_>,
) -> Result<Option<Candidate>, EvaluatorError> {
    let kind = SetupKind::OscillatorExtreme;
    if ctx.len() < RSI_MIN_BARS {
        return Ok(None);
    }
    let price = ctx.price(kind)?;
    let rsi = latest(kind, &calculate_rsi(&ctx.closes, RSI_PERIOD))?;

    if rsi < RSI_OVERSOLD {
        let swing_low = latest(kind, &rolling_min(&ctx.lows, RSI_SWING_BARS, true))?;
        if price > swing_low {
            return Ok(Some(Candidate {
                direction: Direction::Long,
                entry: price,
                stop: swing_low * (1.0 - RSI_STOP_PCT),
                target: price * (1.0 + RSI_TARGET_PCT),
                reason: format!("RSI oversold at {:.1}, price above swing low", rsi),
            }));
        }
    }
    if rsi > RSI_OVERBOUGHT {
        let swing_high = latest(kind, &rolling_max(&ctx.highs, RSI_SWING_BARS, true))?;
        if price < swing_high {
            return Ok(Some(Candidate {
                direction: Direction::Short,
                entry: price,
                stop: swing_high * (1.0 + RSI_STOP_PCT),
                target: price * (1.0 - RSI_TARGET_PCT),
                reason: format!("RSI overbought at {:.1}, price below swing high", rsi),
            }));
        }
    }
    Ok(None)
}

pub fn range_bounce(ctx: &EvaluationContext<'_>) -> Result<Option<Candidate>, EvaluatorError> {
    let kind = SetupKind::RangeBounce;
    if ctx.len() < BAND_WIDTH_LOOKBACK {
        return Ok(None);
    }
    let price = ctx.price(kind)?;
    let bands = calculate_bollinger(&ctx.closes, BAND_PERIOD, BAND_STDDEV);
    let Some(current) = bands.last_bands() else {
        return Err(EvaluatorError::UndefinedIndicator {
            kind,
            indicator: bands.indicator_type.to_string(),
        });
    };

    let widths: Option<Vec<f64>> = (bands.len() - BAND_WIDTH_LOOKBACK..bands.len())
        .map(|i| bands.bands_at(i).map(|b| b.width))
        .collect();
    // band width history still warming up
    let Some(widths) = widths else {
        return Ok(None);
    };
    let avg_width = widths.iter().sum::<f64>() / widths.len() as f64;
    if current.width > avg_width {
        return Ok(None);
    }

    if current.lower != 0.0 && (price - current.lower) / current.lower < BAND_PROXIMITY {
        return Ok(Some(Candidate {
            direction: Direction::Long,
            entry: price,
            stop: current.lower * (1.0 - BAND_STOP_PCT),
            target: current.middle,
            reason: "bounce off lower band in a contracting range".to_string(),
        }));
    }
    if current.upper != 0.0 && (current.upper - price) / current.upper < BAND_PROXIMITY {
        return Ok(Some(Candidate {
            direction: Direction::Short,
            entry: price,
            stop: current.upper * (1.0 + BAND_STOP_PCT),
            target: current.middle,
            reason: "rejection at upper band in a contracting range".to_string(),
        }));
    }
    Ok(None)
}

pub fn momentum(ctx: &EvaluationContext<'_>) -> Result<Option<Candidate>, EvaluatorError> {
    let kind = SetupKind::Momentum;
    if ctx.len() < MOMENTUM_BARS + 2 {
        return Ok(None);
    }
    let price = ctx.price(kind)?;
    let base = ctx.closes[ctx.len() - 1 - MOMENTUM_BARS];
    if base == 0.0 || !base.is_finite() {
        return Ok(None);
    }
    let change = (price - base) / base;

    if change > MOMENTUM_THRESHOLD {
        return Ok(Some(Candidate {
            direction: Direction::Long,
            entry: price,
            stop: price * (1.0 - MOMENTUM_STOP_PCT),
            target: price * (1.0 + MOMENTUM_TARGET_PCT),
            reason: format!("strong {}-bar momentum {:+.2}%", MOMENTUM_BARS, change * 100.0),
        }));
    }
    if change < -MOMENTUM_THRESHOLD {
        return Ok(Some(Candidate {
            direction: Direction::Short,
            entry: price,
            stop: price * (1.0 + MOMENTUM_STOP_PCT),
            target: price * (1.0 - MOMENTUM_TARGET_PCT),
            reason: format!("strong {}-bar momentum {:+.2}%", MOMENTUM_BARS, change * 100.0),
        }));
    }
    Ok(None)
}
