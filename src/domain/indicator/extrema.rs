//! Rolling maximum / minimum.
//!
//! With `include_current` the window for point i is [i-n+1, i] and the
//! first (n-1) points are invalid. Without it the window is [i-n, i-1],
//! i.e. the n bars strictly before i, and the first n points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn rolling_max(values: &[f64], period: usize, include_current: bool) -> IndicatorSeries {
    rolling(
        values,
        period,
        include_current,
        IndicatorType::RollingMax {
            period,
            include_current,
        },
        f64::max,
    )
}

pub fn rolling_min(values: &[f64], period: usize, include_current: bool) -> IndicatorSeries {
    rolling(
        values,
        period,
        include_current,
        IndicatorType::RollingMin {
            period,
            include_current,
        },
        f64::min,
    )
}

fn rolling(
    values: &[f64],
    period: usize,
    include_current: bool,
    indicator_type: IndicatorType,
    pick: fn(f64, f64) -> f64,
) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(indicator_type, values.len());
    }

    let offset = usize::from(!include_current);
    let points = (0..values.len())
        .map(|i| {
            if i + 1 < period + offset {
                return IndicatorPoint::invalid();
            }
            let end = i + 1 - offset;
            let window = &values[end - period..end];
            let extreme = window[1..].iter().copied().fold(window[0], pick);
            IndicatorPoint::simple(extreme)
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values: points,
    }
}
