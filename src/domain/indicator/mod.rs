//! Technical indicators over price series.
//!
//! Every calculation returns an [`IndicatorSeries`] with exactly one point per
//! input value. Points inside the warm-up window (or where the value cannot be
//! computed) are marked invalid, so callers index the output by bar position.
//!
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorValue`: the shape of the value (scalar or band triple)
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: the aligned output series

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod extrema;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use extrema::{rolling_max, rolling_min};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub fn simple(value: f64) -> Self {
        Self {
            valid: value.is_finite(),
            value: IndicatorValue::Simple(value),
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            value: IndicatorValue::Simple(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bands(Bands),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Stddev(usize),
    Rsi(usize),
    Atr(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    RollingMax {
        period: usize,
        include_current: bool,
    },
    RollingMin {
        period: usize,
        include_current: bool,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// A series of `len` invalid points.
    pub fn undefined(indicator_type: IndicatorType, len: usize) -> Self {
        Self {
            indicator_type,
            values: vec![IndicatorPoint::invalid(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index)? {
            IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
            } => Some(*v),
            _ => None,
        }
    }

    pub fn bands_at(&self, index: usize) -> Option<Bands> {
        match self.values.get(index)? {
            IndicatorPoint {
                valid: true,
                value: IndicatorValue::Bands(b),
            } => Some(*b),
            _ => None,
        }
    }

    pub fn last_simple(&self) -> Option<f64> {
        self.simple_at(self.values.len().checked_sub(1)?)
    }

    pub fn last_bands(&self) -> Option<Bands> {
        self.bands_at(self.values.len().checked_sub(1)?)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::RollingMax {
                period,
                include_current,
            } => {
                let suffix = if *include_current { "" } else { ",prior" };
                write!(f, "MAX({}{})", period, suffix)
            }
            IndicatorType::RollingMin {
                period,
                include_current,
            } => {
                let suffix = if *include_current { "" } else { ",prior" };
                write!(f, "MIN({}{})", period, suffix)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Ema(21).to_string(), "EMA(21)");
        assert_eq!(
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
            .to_string(),
            "BOLLINGER(20,2)"
        );
        assert_eq!(
            IndicatorType::RollingMax {
                period: 20,
                include_current: false
            }
            .to_string(),
            "MAX(20,prior)"
        );
    }

    #[test]
    fn non_finite_simple_point_is_invalid() {
        assert!(!IndicatorPoint::simple(f64::NAN).valid);
        assert!(!IndicatorPoint::simple(f64::INFINITY).valid);
        assert!(IndicatorPoint::simple(1.5).valid);
    }

    #[test]
    fn last_simple_skips_invalid_tail() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![IndicatorPoint::simple(1.0), IndicatorPoint::invalid()],
        };
        assert_eq!(series.simple_at(0), Some(1.0));
        assert_eq!(series.last_simple(), None);
    }

    #[test]
    fn undefined_series_keeps_length() {
        let series = IndicatorSeries::undefined(IndicatorType::Rsi(14), 7);
        assert_eq!(series.len(), 7);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.last_simple(), None);
    }

    #[test]
    fn empty_series_has_no_last_value() {
        let series = IndicatorSeries::undefined(IndicatorType::Ema(5), 0);
        assert!(series.is_empty());
        assert_eq!(series.last_simple(), None);
        assert_eq!(series.last_bands(), None);
    }
}
