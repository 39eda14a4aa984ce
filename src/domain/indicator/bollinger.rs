//! Bollinger Bands: SMA(n) middle band with bands at +/- k sample standard
//! deviations. Width is (upper - lower) / middle.
//!
//! Warmup: first (n-1) points are invalid. A zero middle band has no defined
//! width and is reported invalid.

use crate::domain::indicator::{
    Bands, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, calculate_sma,
    calculate_stddev,
};

pub fn calculate_bollinger(values: &[f64], period: usize, stddev_mult: f64) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100: (stddev_mult * 100.0).round() as u32,
    };
    let sma = calculate_sma(values, period);
    let stddev = calculate_stddev(values, period);

    let points = (0..values.len())
        .map(|i| match (sma.simple_at(i), stddev.simple_at(i)) {
            (Some(middle), Some(sd)) if middle != 0.0 => {
                let upper = middle + stddev_mult * sd;
                let lower = middle - stddev_mult * sd;
                let width = (upper - lower) / middle;
                IndicatorPoint {
                    valid: width.is_finite(),
                    value: IndicatorValue::Bands(Bands {
                        upper,
                        middle,
                        lower,
                        width,
                    }),
                }
            }
            _ => IndicatorPoint::invalid(),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values: points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_warmup() {
        let series = calculate_bollinger(&[1.0, 2.0, 3.0, 4.0], 3, 2.0);
        assert_eq!(series.bands_at(1), None);
        assert!(series.bands_at(2).is_some());
    }

    #[test]
    fn bollinger_values() {
        // window 1,2,3: mean 2, sample sd 1
        let series = calculate_bollinger(&[1.0, 2.0, 3.0], 3, 2.0);
        let bands = series.last_bands().unwrap();
        assert!((bands.middle - 2.0).abs() < 1e-10);
        assert!((bands.upper - 4.0).abs() < 1e-10);
        assert!((bands.lower - 0.0).abs() < 1e-10);
        assert!((bands.width - 2.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_flat_has_zero_width() {
        let series = calculate_bollinger(&[50.0; 25], 20, 2.0);
        let bands = series.last_bands().unwrap();
        assert!(bands.width.abs() < f64::EPSILON);
        assert!((bands.upper - bands.lower).abs() < f64::EPSILON);
    }

    #[test]
    fn bollinger_zero_middle_is_invalid() {
        let series = calculate_bollinger(&[0.0; 5], 3, 2.0);
        assert_eq!(series.last_bands(), None);
    }

    #[test]
    fn bollinger_indicator_type() {
        let series = calculate_bollinger(&[1.0], 20, 2.0);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
        );
    }
}
