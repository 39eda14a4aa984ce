//! Average True Range as a simple rolling mean of true range.
//!
//! TR[0] = high - low (no previous close)
//! TR[i] = max(high - low, |high - prev_close|, |low - prev_close|)
//! ATR(n)[i] = mean(TR[i-n+1 ..= i])
//! Warmup: first (n-1) points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| match i {
            0 => bar.high - bar.low,
            _ => bar.true_range(bars[i - 1].close),
        })
        .collect()
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(IndicatorType::Atr(period), bars.len());
    }

    let tr = true_ranges(bars);
    let points = (0..tr.len())
        .map(|i| {
            if i + 1 < period {
                IndicatorPoint::invalid()
            } else {
                let window = &tr[i + 1 - period..=i];
                IndicatorPoint::simple(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(minute: u32, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            symbol: "TEST".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, minute, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn atr_basic() {
        let bars = vec![
            make_bar(0, 12.0, 10.0, 11.0), // TR = 2
            make_bar(1, 13.0, 11.0, 12.0), // TR = max(2, 2, 0) = 2
            make_bar(2, 16.0, 12.0, 15.0), // TR = max(4, 4, 0) = 4
        ];
        let series = calculate_atr(&bars, 2);
        assert_eq!(series.simple_at(0), None);
        assert_eq!(series.simple_at(1), Some(2.0));
        assert_eq!(series.simple_at(2), Some(3.0));
    }

    #[test]
    fn atr_handles_gaps() {
        let bars = vec![
            make_bar(0, 11.0, 10.0, 10.0), // TR = 1
            make_bar(1, 21.0, 20.0, 20.0), // TR = |21 - 10| = 11
        ];
        let tr = true_ranges(&bars);
        assert_eq!(tr, vec![1.0, 11.0]);
        assert_eq!(calculate_atr(&bars, 2).last_simple(), Some(6.0));
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars = vec![make_bar(0, 12.0, 10.0, 11.0)];
        let series = calculate_atr(&bars, 14);
        assert_eq!(series.len(), 1);
        assert_eq!(series.last_simple(), None);
    }

    #[test]
    fn atr_flat_bars_is_zero() {
        let bars: Vec<OhlcvBar> = (0..20).map(|m| make_bar(m, 5.0, 5.0, 5.0)).collect();
        assert_eq!(calculate_atr(&bars, 14).last_simple(), Some(0.0));
    }
}
