//! Significance-test primitives.
//!
//! Each test is a pure function returning a statistic and a p-value; the
//! identification engine treats these as black boxes.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};

/// Ljung-Box test result.
#[derive(Debug, Clone)]
pub struct LjungBoxResult {
    /// Test statistic Q.
    pub statistic: f64,
    /// P-value.
    pub p_value: f64,
    /// Number of lags tested.
    pub lags: usize,
    /// Degrees of freedom.
    pub df: usize,
}

impl LjungBoxResult {
    /// True when the null of white-noise residuals is not rejected at
    /// level `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Ljung-Box test for autocorrelation in residuals.
///
/// `fitted_params` reduces the degrees of freedom of the chi-squared
/// reference distribution.
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    let n = residuals.len();
    if n < 3 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            df: 0,
        };
    }

    let lags = lags.unwrap_or_else(|| 2 * (n / 24).max(1) + 10).min(n - 1);

    let mean: f64 = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|&x| x - mean).collect();
    let var: f64 = centered.iter().map(|&x| x * x).sum::<f64>();

    let df = lags.saturating_sub(fitted_params).max(1);
    if var == 0.0 {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        };
    }

    let mut q = 0.0;
    for k in 1..=lags {
        let acf_k: f64 = centered
            .iter()
            .skip(k)
            .zip(centered.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / var;
        q += (acf_k * acf_k) / (n - k) as f64;
    }
    q *= n as f64 * (n + 2) as f64;

    LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, df as f64),
        lags,
        df,
    }
}

/// Upper-tail chi-squared probability.
pub fn chi_squared_sf(x: f64, df: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 || df <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(df) {
        Ok(dist) => 1.0 - dist.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value of a Student-t statistic with `df` degrees of freedom.
pub fn t_p_value(t: f64, df: usize) -> f64 {
    if !t.is_finite() || df == 0 {
        return 1.0;
    }
    match StudentsT::new(0.0, 1.0, df as f64) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    }
}

/// Upper-tail p-value of an F statistic with `(df1, df2)` degrees of freedom.
pub fn f_p_value(f: f64, df1: usize, df2: usize) -> f64 {
    if !f.is_finite() || f <= 0.0 || df1 == 0 || df2 == 0 {
        return 1.0;
    }
    match FisherSnedecor::new(df1 as f64, df2 as f64) {
        Ok(dist) => 1.0 - dist.cdf(f),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ljung_box_white_noise_has_high_p() {
        let residuals: Vec<f64> = (0..200)
            .map(|i| ((i * 37 + 11) % 101) as f64 / 50.0 - 1.0)
            .collect();
        let result = ljung_box(&residuals, Some(12), 0);
        assert!(result.statistic >= 0.0);
        assert!(result.p_value > 0.01);
        assert_eq!(result.lags, 12);
    }

    #[test]
    fn ljung_box_detects_autocorrelation() {
        let mut residuals = vec![1.0; 120];
        for i in 1..120 {
            residuals[i] = 0.9 * residuals[i - 1] + 0.05 * ((i * 17) % 23) as f64;
        }
        let result = ljung_box(&residuals, Some(12), 0);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn ljung_box_constant_residuals() {
        let result = ljung_box(&[1.0; 50], Some(5), 0);
        assert_relative_eq!(result.statistic, 0.0);
        assert_relative_eq!(result.p_value, 1.0);
    }

    #[test]
    fn ljung_box_df_correction() {
        let residuals: Vec<f64> = (0..100)
            .map(|i| ((i * 17 + 13) % 97) as f64 / 50.0 - 1.0)
            .collect();
        let unadjusted = ljung_box(&residuals, Some(10), 0);
        let adjusted = ljung_box(&residuals, Some(10), 3);
        assert_eq!(unadjusted.df, 10);
        assert_eq!(adjusted.df, 7);
        assert!(adjusted.p_value <= unadjusted.p_value);
    }

    #[test]
    fn ljung_box_short_series() {
        let result = ljung_box(&[1.0, 2.0], Some(5), 0);
        assert!(result.statistic.is_nan());
    }

    #[test]
    fn t_p_value_known_quantiles() {
        // |t| = 1.96 with large df is borderline at 5%
        let p = t_p_value(1.96, 1000);
        assert!((p - 0.05).abs() < 0.005);
        // symmetric in the sign
        assert_relative_eq!(t_p_value(-2.5, 30), t_p_value(2.5, 30));
    }

    #[test]
    fn f_p_value_known_quantiles() {
        // F(6, 100) upper 5% critical value is about 2.19
        let p = f_p_value(2.19, 6, 100);
        assert!((p - 0.05).abs() < 0.01);
        assert_relative_eq!(f_p_value(0.0, 6, 100), 1.0);
    }

    #[test]
    fn chi_squared_sf_known_values() {
        // df=2 is exponential: P(X > 2) = exp(-1)
        let p = chi_squared_sf(2.0, 2.0);
        assert_relative_eq!(p, (-1.0f64).exp(), epsilon = 1e-6);
        // P(X > 18.31) with df=10 is close to 0.05
        let p = chi_squared_sf(18.31, 10.0);
        assert!((p - 0.05).abs() < 0.005);
    }

    #[test]
    fn degenerate_inputs_return_one() {
        assert_relative_eq!(t_p_value(f64::NAN, 10), 1.0);
        assert_relative_eq!(f_p_value(1.0, 0, 10), 1.0);
        assert_relative_eq!(chi_squared_sf(-1.0, 5.0), 1.0);
    }
}
