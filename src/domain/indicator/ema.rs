//! Exponential Moving Average.
//!
//! Recursive form with smoothing factor k = 2 / (span + 1):
//! EMA[0] = v[0]
//! EMA[i] = v[i] * k + EMA[i-1] * (1 - k)
//!
//! The recursion runs from the first value, but points before index
//! `span - 1` are reported invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_ema(values: &[f64], span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries::undefined(IndicatorType::Ema(span), values.len());
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut ema = 0.0;
    let mut points = Vec::with_capacity(values.len());

    for (i, &v) in values.iter().enumerate() {
        ema = if i == 0 { v } else { v * k + ema * (1.0 - k) };
        if i + 1 < span {
            points.push(IndicatorPoint::invalid());
        } else {
            points.push(IndicatorPoint::simple(ema));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values: points,
    }
}
