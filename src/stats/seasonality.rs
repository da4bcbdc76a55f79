//! Seasonality pre-test.
//!
//! Decides once per run whether the series carries seasonal structure and
//! how strong it is. The outcome seeds the run context and is never
//! revisited by the identification loop.

use crate::series::difference;
use crate::stats::acf::autocorrelations;

/// Outcome of the seasonality pre-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalityTest {
    /// Whether the series carries seasonal structure.
    pub seasonal: bool,
    /// Strength code: 0 none, 1 weak, 2 strong.
    pub strength: i32,
}

/// Test for seasonality at the given annual frequency.
///
/// Works on the first-differenced series: significant positive
/// autocorrelation at the seasonal lag (and its double) indicates seasonal
/// structure. Significance bands are the usual `z / sqrt(n)` limits.
pub fn test_seasonality(values: &[f64], frequency: usize) -> SeasonalityTest {
    if frequency < 2 || values.len() < 3 * frequency {
        return SeasonalityTest {
            seasonal: false,
            strength: 0,
        };
    }

    let diff = difference(values, 1);
    let n = diff.len();
    let max_lag = 2 * frequency;
    if n <= max_lag {
        return SeasonalityTest {
            seasonal: false,
            strength: 0,
        };
    }

    let acf = autocorrelations(&diff, max_lag);
    let se = 1.0 / (n as f64).sqrt();
    let r1 = acf[frequency];
    let r2 = acf[2 * frequency];

    let strength = if r1 > 2.58 * se && r2 > 1.96 * se {
        2
    } else if r1 > 1.96 * se {
        1
    } else {
        0
    };

    SeasonalityTest {
        seasonal: strength > 0,
        strength,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_series(n: usize, period: usize, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                100.0
                    + amplitude * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin()
                    + 0.3 * ((i * 13 % 17) as f64 - 8.0)
            })
            .collect()
    }

    #[test]
    fn strong_seasonal_pattern_scores_two() {
        let values = seasonal_series(144, 12, 25.0);
        let test = test_seasonality(&values, 12);
        assert!(test.seasonal);
        assert_eq!(test.strength, 2);
    }

    #[test]
    fn noise_scores_zero() {
        let values: Vec<f64> = (0..144)
            .map(|i| ((i * 37 + 11) % 101) as f64 / 10.0)
            .collect();
        let test = test_seasonality(&values, 12);
        assert!(!test.seasonal);
        assert_eq!(test.strength, 0);
    }

    #[test]
    fn non_seasonal_frequency_scores_zero() {
        let values = seasonal_series(60, 12, 25.0);
        let test = test_seasonality(&values, 1);
        assert!(!test.seasonal);
    }

    #[test]
    fn short_series_scores_zero() {
        let values = seasonal_series(20, 12, 25.0);
        let test = test_seasonality(&values, 12);
        assert!(!test.seasonal);
    }
}
