//! Rolling sample standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((v[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) points are invalid. A period below 2 has no sample
//! deviation and yields an all-invalid series.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_stddev(values: &[f64], period: usize) -> IndicatorSeries {
    if period < 2 {
        return IndicatorSeries::undefined(IndicatorType::Stddev(period), values.len());
    }

    let mut points = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i + 1 < period {
            points.push(IndicatorPoint::invalid());
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;
        points.push(IndicatorPoint::simple(variance.sqrt()));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values: points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorValue;

    #[test]
    fn stddev_warmup() {
        let series = calculate_stddev(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn stddev_constant_values() {
        let series = calculate_stddev(&[100.0; 5], 3);
        if let IndicatorValue::Simple(v) = series.values[2].value {
            assert!(v.abs() < f64::EPSILON);
        } else {
            panic!("Expected Simple value");
        }
    }

    #[test]
    fn stddev_uses_sample_denominator() {
        // mean 5, squared deviations sum to 32, / (8 - 1)
        let series = calculate_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((series.last_simple().unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn stddev_period_one_is_undefined() {
        let series = calculate_stddev(&[1.0, 2.0, 3.0], 1);
        assert_eq!(series.len(), 3);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
