//! Autocovariance and autocorrelation functions.

/// Autocovariances of a series for lags `0..=max_lag`, mean-removed.
///
/// Uses the biased (1/n) estimator, which keeps the sequence positive
/// semi-definite.
pub fn autocovariances(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return vec![0.0; max_lag + 1];
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();

    (0..=max_lag)
        .map(|lag| {
            if lag >= n {
                0.0
            } else {
                centered
                    .iter()
                    .skip(lag)
                    .zip(centered.iter())
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / n as f64
            }
        })
        .collect()
}

/// Autocorrelations for lags `0..=max_lag` (lag 0 is 1 by construction).
pub fn autocorrelations(values: &[f64], max_lag: usize) -> Vec<f64> {
    let cov = autocovariances(values, max_lag);
    let var = cov[0];
    if var <= 0.0 {
        let mut out = vec![0.0; max_lag + 1];
        if max_lag < out.len() {
            out[0] = 1.0;
        }
        return out;
    }
    cov.iter().map(|c| c / var).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lag_zero_is_variance() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let cov = autocovariances(&values, 2);
        assert_relative_eq!(cov[0], 2.0); // biased variance of 1..5
    }

    #[test]
    fn autocorrelation_lag_zero_is_one() {
        let values = vec![1.0, -2.0, 3.0, 0.5, 1.5];
        let acf = autocorrelations(&values, 3);
        assert_relative_eq!(acf[0], 1.0);
    }

    #[test]
    fn alternating_series_has_negative_lag_one() {
        let values: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let acf = autocorrelations(&values, 2);
        assert!(acf[1] < -0.9);
        assert!(acf[2] > 0.9);
    }

    #[test]
    fn constant_series_has_zero_acf() {
        let values = vec![3.0; 20];
        let acf = autocorrelations(&values, 4);
        assert_relative_eq!(acf[0], 1.0);
        for lag in 1..=4 {
            assert_relative_eq!(acf[lag], 0.0);
        }
    }

    #[test]
    fn lags_beyond_length_are_zero() {
        let values = vec![1.0, 2.0];
        let cov = autocovariances(&values, 5);
        assert_eq!(cov.len(), 6);
        for c in cov.iter().skip(2) {
            assert_relative_eq!(*c, 0.0);
        }
    }
}
