//! RSI (Relative Strength Index) with simple-mean averaging.
//!
//! For each point i, the average gain and average loss are plain means of
//! the last n price changes (changes i-n+1 ..= i).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n points are invalid (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_rsi(values: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(IndicatorType::Rsi(period), values.len());
    }

    // changes[j] is the move into point j + 1
    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut points = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i < period {
            points.push(IndicatorPoint::invalid());
            continue;
        }
        let window = &changes[i - period..i];
        let avg_gain = window.iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
        let avg_loss = window.iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        points.push(IndicatorPoint::simple(rsi));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values: points,
    }
}
