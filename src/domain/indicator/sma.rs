//! Simple Moving Average over a rolling window of n values.
//!
//! Warmup: first (n-1) points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_sma(values: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(IndicatorType::Sma(period), values.len());
    }

    let points = (0..values.len())
        .map(|i| {
            if i + 1 < period {
                IndicatorPoint::invalid()
            } else {
                let window = &values[i + 1 - period..=i];
                IndicatorPoint::simple(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: points,
    }
}
