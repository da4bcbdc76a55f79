//! Concentrated conditional-sum-of-squares estimation of the working model.
//!
//! The regression coefficients are concentrated out of the ARMA objective:
//! for a trial ARMA vector, the differenced series and every differenced
//! regressor column are run through the ARMA recursion and the filtered
//! normal equations are solved; the simplex search then minimizes the
//! residual sum of squares over the ARMA vector alone.

use nalgebra::{DMatrix, DVector};

use crate::error::{RegArimaError, Result};
use crate::estimation::optimizer::{minimize, SimplexConfig};
use crate::model::orders::SarimaOrders;
use crate::model::ModelDescription;
use crate::series::{difference, seasonal_difference};

/// Estimation-precision policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precision {
    /// Convergence tolerance of the nonlinear search.
    pub tolerance: f64,
    /// Iteration cap of the nonlinear search.
    pub max_iter: usize,
}

impl Precision {
    /// Coarse precision used inside the identification loop.
    pub fn intermediate() -> Self {
        Self {
            tolerance: 1e-5,
            max_iter: 300,
        }
    }

    /// Fine precision used for the final fit.
    pub fn exact() -> Self {
        Self {
            tolerance: 1e-7,
            max_iter: 1000,
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::intermediate()
    }
}

/// Result of one estimation of the working model.
///
/// Recomputed from scratch whenever the model structure changes; the model
/// clears it on every structural mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimation {
    /// ARMA parameters, laid out `[phi, bphi, theta, btheta]`.
    pub parameters: Vec<f64>,
    /// t statistics of the ARMA parameters.
    pub parameter_tstats: Vec<f64>,
    /// Regression coefficients, one per design column, mean last.
    pub coefficients: Vec<f64>,
    /// t statistics of the regression coefficients.
    pub coefficient_tstats: Vec<f64>,
    /// Covariance of the regression coefficients (row-major).
    pub coefficient_covariance: Vec<Vec<f64>>,
    /// Design-column names aligned with `coefficients` (`"mean"` last).
    pub coefficient_names: Vec<String>,
    /// Filtered residuals.
    pub residuals: Vec<f64>,
    /// Residual sum of squares.
    pub ssq: f64,
    /// Concentrated Gaussian log-likelihood.
    pub log_likelihood: f64,
    /// Residual degrees of freedom.
    pub dof: usize,
    /// Number of free parameters (ARMA plus regression).
    pub free_parameters: usize,
}

impl Estimation {
    /// Residual standard error.
    pub fn sigma(&self) -> f64 {
        (self.ssq / self.dof.max(1) as f64).sqrt()
    }

    /// Schwarz information criterion of the fit.
    pub fn bic(&self) -> f64 {
        let n = self.residuals.len().max(1) as f64;
        -2.0 * self.log_likelihood + self.free_parameters as f64 * n.ln()
    }

    /// t statistic of the named regression coefficient.
    pub fn coefficient_tstat(&self, name: &str) -> Option<f64> {
        self.coefficient_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.coefficient_tstats[i])
    }

    #[cfg(test)]
    pub(crate) fn empty_for_tests() -> Self {
        Self {
            parameters: vec![],
            parameter_tstats: vec![],
            coefficients: vec![],
            coefficient_tstats: vec![],
            coefficient_covariance: vec![],
            coefficient_names: vec![],
            residuals: vec![],
            ssq: 0.0,
            log_likelihood: 0.0,
            dof: 1,
            free_parameters: 0,
        }
    }
}

/// Split an ARMA parameter vector into `(phi, bphi, theta, btheta)`.
pub fn split_parameters(orders: SarimaOrders, params: &[f64]) -> (&[f64], &[f64], &[f64], &[f64]) {
    let (phi, rest) = params.split_at(orders.p.min(params.len()));
    let (bphi, rest) = rest.split_at(orders.bp.min(rest.len()));
    let (theta, rest) = rest.split_at(orders.q.min(rest.len()));
    let (btheta, _) = rest.split_at(orders.bq.min(rest.len()));
    (phi, bphi, theta, btheta)
}

fn poly_multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Expand the multiplicative ARMA structure into full lag polynomials.
///
/// Returns `(ar, ma)` with `ar[0] == ma[0] == 1`; the AR polynomial is
/// `phi(B) * bphi(B^s)` with coefficients entering negatively, the MA
/// polynomial `theta(B) * btheta(B^s)` with coefficients entering
/// positively.
pub fn expand_polynomials(
    orders: SarimaOrders,
    params: &[f64],
    period: usize,
) -> (Vec<f64>, Vec<f64>) {
    let (phi, bphi, theta, btheta) = split_parameters(orders, params);

    let mut ar_regular = vec![0.0; orders.p + 1];
    ar_regular[0] = 1.0;
    for (i, &v) in phi.iter().enumerate() {
        ar_regular[i + 1] = -v;
    }
    let mut ar_seasonal = vec![0.0; orders.bp * period + 1];
    ar_seasonal[0] = 1.0;
    for (i, &v) in bphi.iter().enumerate() {
        ar_seasonal[(i + 1) * period] = -v;
    }

    let mut ma_regular = vec![0.0; orders.q + 1];
    ma_regular[0] = 1.0;
    for (i, &v) in theta.iter().enumerate() {
        ma_regular[i + 1] = v;
    }
    let mut ma_seasonal = vec![0.0; orders.bq * period + 1];
    ma_seasonal[0] = 1.0;
    for (i, &v) in btheta.iter().enumerate() {
        ma_seasonal[(i + 1) * period] = v;
    }

    (
        poly_multiply(&ar_regular, &ar_seasonal),
        poly_multiply(&ma_regular, &ma_seasonal),
    )
}

/// Run a series through the ARMA recursion with zero pre-sample values.
///
/// `ar` and `ma` are full lag polynomials with leading ones; the output is
/// the innovation series of the same length as the input.
pub fn filter(input: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let n = input.len();
    let mut out = vec![0.0; n];
    for t in 0..n {
        let mut value = 0.0;
        for (i, &a) in ar.iter().enumerate() {
            if i > t {
                break;
            }
            value += a * input[t - i];
        }
        for (j, &m) in ma.iter().enumerate().skip(1) {
            if j > t {
                break;
            }
            value -= m * out[t - j];
        }
        out[t] = value;
    }
    out
}

/// Difference a slice by the model's regular and seasonal orders.
fn apply_differencing(values: &[f64], orders: SarimaOrders, period: usize) -> Vec<f64> {
    seasonal_difference(&difference(values, orders.d), orders.bd, period)
}

struct Design {
    dy: Vec<f64>,
    columns: Vec<Vec<f64>>,
    names: Vec<String>,
}

fn build_design(model: &ModelDescription) -> Result<Design> {
    let span = model.span();
    let orders = model.orders();
    let period = model.frequency();

    let adjusted = model.adjusted_series();
    if span.end > adjusted.len() || span.is_empty() {
        return Err(RegArimaError::InvalidParameter(
            "estimation span outside series domain".to_string(),
        ));
    }
    let window = &adjusted[span.start..span.end];
    let dy = apply_differencing(window, orders, period);

    let mut columns = Vec::new();
    let mut names = Vec::new();
    for (name, column) in model.regression_columns() {
        // user-supplied columns are the only ones not generated to length
        if column.len() != adjusted.len() {
            return Err(RegArimaError::DimensionMismatch {
                expected: adjusted.len(),
                got: column.len(),
            });
        }
        let window = &column[span.start..span.end];
        columns.push(apply_differencing(window, orders, period));
        names.push(name);
    }
    if model.mean() {
        columns.push(vec![1.0; dy.len()]);
        names.push("mean".to_string());
    }
    Ok(Design { dy, columns, names })
}

/// Filtered least squares at a fixed ARMA point.
///
/// Returns `(coefficients, residuals, ssq)`, or `None` when the normal
/// matrix is singular.
fn concentrated_fit(
    design: &Design,
    ar: &[f64],
    ma: &[f64],
) -> Option<(Vec<f64>, Vec<f64>, f64)> {
    let fy = filter(&design.dy, ar, ma);
    let n = fy.len();
    let k = design.columns.len();

    if k == 0 {
        let ssq: f64 = fy.iter().map(|e| e * e).sum();
        return ssq.is_finite().then_some((vec![], fy, ssq));
    }

    let filtered: Vec<Vec<f64>> = design
        .columns
        .iter()
        .map(|c| filter(c, ar, ma))
        .collect();

    let mut xtx = DMatrix::<f64>::zeros(k, k);
    let mut xty = DVector::<f64>::zeros(k);
    for i in 0..k {
        for j in i..k {
            let dot: f64 = filtered[i].iter().zip(&filtered[j]).map(|(a, b)| a * b).sum();
            xtx[(i, j)] = dot;
            xtx[(j, i)] = dot;
        }
        xty[i] = filtered[i].iter().zip(&fy).map(|(a, b)| a * b).sum();
    }

    let chol = xtx.cholesky()?;
    let beta = chol.solve(&xty);

    let mut residuals = fy;
    for t in 0..n {
        for i in 0..k {
            residuals[t] -= beta[i] * filtered[i][t];
        }
    }
    let ssq: f64 = residuals.iter().map(|e| e * e).sum();
    ssq.is_finite()
        .then(|| (beta.iter().copied().collect(), residuals, ssq))
}

fn objective(design: &Design, orders: SarimaOrders, period: usize, params: &[f64]) -> f64 {
    let (ar, ma) = expand_polynomials(orders, params, period);
    match concentrated_fit(design, &ar, &ma) {
        Some((_, _, ssq)) => ssq,
        None => f64::MAX,
    }
}

/// Central-difference Hessian of the concentrated objective.
fn numerical_hessian<F>(f: F, point: &[f64]) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = point.len();
    let h = 1e-4;
    let mut hessian = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let mut pp = point.to_vec();
            let mut pm = point.to_vec();
            let mut mp = point.to_vec();
            let mut mm = point.to_vec();
            pp[i] += h;
            pp[j] += h;
            pm[i] += h;
            pm[j] -= h;
            mp[i] -= h;
            mp[j] += h;
            mm[i] -= h;
            mm[j] -= h;
            let value = (f(&pp) - f(&pm) - f(&mp) + f(&mm)) / (4.0 * h * h);
            hessian[(i, j)] = value;
            hessian[(j, i)] = value;
        }
    }
    hessian
}

/// Estimate the working model at the given precision.
///
/// This is the numeric estimation primitive of the engine: it never mutates
/// the model; the caller attaches the result.
pub fn estimate(model: &ModelDescription, precision: Precision) -> Result<Estimation> {
    let orders = model.orders();
    let period = model.frequency();
    let design = build_design(model)?;

    let n_eff = design.dy.len();
    let n_regression = design.columns.len();
    let n_arma = orders.free_parameters();
    let free_parameters = n_regression + n_arma;

    if n_eff < free_parameters + 8 {
        return Err(RegArimaError::InsufficientData {
            needed: free_parameters + 8,
            got: n_eff,
        });
    }

    let params = if n_arma > 0 {
        let bounds = vec![(-0.99, 0.99); n_arma];
        let config = SimplexConfig {
            max_iter: precision.max_iter,
            tolerance: precision.tolerance,
            initial_step: 0.1,
        };
        let result = minimize(
            |p| objective(&design, orders, period, p),
            &vec![0.1; n_arma],
            Some(&bounds),
            config,
        );
        if !result.value.is_finite() || result.value == f64::MAX {
            return Err(RegArimaError::Estimation(
                "nonlinear search did not produce a finite objective".to_string(),
            ));
        }
        result.point
    } else {
        vec![]
    };

    let (ar, ma) = expand_polynomials(orders, &params, period);
    let Some((coefficients, residuals, ssq)) = concentrated_fit(&design, &ar, &ma) else {
        return Err(RegArimaError::Computation(
            "singular regression at the optimum".to_string(),
        ));
    };

    let dof = n_eff.saturating_sub(free_parameters);
    if dof == 0 {
        return Err(RegArimaError::Estimation(
            "no residual degrees of freedom".to_string(),
        ));
    }
    let sigma2 = ssq / dof as f64;

    // regression covariance and t statistics from the filtered design
    let (coefficient_covariance, coefficient_tstats) = if n_regression > 0 {
        let filtered: Vec<Vec<f64>> = design.columns.iter().map(|c| filter(c, &ar, &ma)).collect();
        let mut xtx = DMatrix::<f64>::zeros(n_regression, n_regression);
        for i in 0..n_regression {
            for j in i..n_regression {
                let dot: f64 = filtered[i].iter().zip(&filtered[j]).map(|(a, b)| a * b).sum();
                xtx[(i, j)] = dot;
                xtx[(j, i)] = dot;
            }
        }
        let inverse = xtx
            .cholesky()
            .map(|c| c.inverse())
            .ok_or_else(|| {
                RegArimaError::Computation("singular regression covariance".to_string())
            })?;
        let covariance: Vec<Vec<f64>> = (0..n_regression)
            .map(|i| (0..n_regression).map(|j| sigma2 * inverse[(i, j)]).collect())
            .collect();
        let tstats: Vec<f64> = coefficients
            .iter()
            .enumerate()
            .map(|(i, &b)| {
                let se = covariance[i][i].sqrt();
                if se > 0.0 {
                    b / se
                } else {
                    0.0
                }
            })
            .collect();
        (covariance, tstats)
    } else {
        (vec![], vec![])
    };

    // ARMA t statistics from a finite-difference Hessian of the objective
    let parameter_tstats = if n_arma > 0 {
        let hessian = numerical_hessian(|p| objective(&design, orders, period, p), &params);
        match hessian.cholesky() {
            Some(chol) => {
                let inverse = chol.inverse();
                params
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| {
                        let var = 2.0 * sigma2 * inverse[(i, i)];
                        if var > 0.0 {
                            v / var.sqrt()
                        } else {
                            0.0
                        }
                    })
                    .collect()
            }
            None => vec![0.0; n_arma],
        }
    } else {
        vec![]
    };

    let log_likelihood = -0.5
        * n_eff as f64
        * ((2.0 * std::f64::consts::PI).ln() + (ssq / n_eff as f64).ln() + 1.0);

    Ok(Estimation {
        parameters: params,
        parameter_tstats,
        coefficients,
        coefficient_tstats,
        coefficient_covariance,
        coefficient_names: design.names,
        residuals,
        ssq,
        log_likelihood,
        dof,
        free_parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn model_from(values: Vec<f64>, frequency: usize) -> ModelDescription {
        ModelDescription::new(values, frequency, (2010, 0), false)
    }

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn expand_airline_polynomials() {
        let orders = SarimaOrders::airline(true);
        let (ar, ma) = expand_polynomials(orders, &[-0.4, -0.6], 12);
        assert_eq!(ar, vec![1.0]);
        assert_eq!(ma.len(), 14);
        assert_relative_eq!(ma[0], 1.0);
        assert_relative_eq!(ma[1], -0.4);
        assert_relative_eq!(ma[12], -0.6);
        assert_relative_eq!(ma[13], 0.24);
    }

    #[test]
    fn filter_inverts_ar_recursion() {
        // u_t = 0.5 u_{t-1} + e_t with known innovations
        let e = vec![1.0, -0.5, 0.3, 0.8, -1.0];
        let mut u = vec![0.0; 5];
        u[0] = e[0];
        for t in 1..5 {
            u[t] = 0.5 * u[t - 1] + e[t];
        }
        let recovered = filter(&u, &[1.0, -0.5], &[1.0]);
        for (a, b) in recovered.iter().zip(&e) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn estimates_ar1_coefficient() {
        let e = noise(400, 7);
        let mut values = vec![0.0; 400];
        values[0] = e[0];
        for t in 1..400 {
            values[t] = 0.7 * values[t - 1] + e[t];
        }
        let mut model = model_from(values, 12);
        model.set_orders(SarimaOrders {
            p: 1,
            ..SarimaOrders::none()
        });

        let est = estimate(&model, Precision::exact()).unwrap();
        assert_relative_eq!(est.parameters[0], 0.7, epsilon = 0.1);
        assert!(est.parameter_tstats[0].abs() > 5.0);
    }

    #[test]
    fn mean_coefficient_recovers_level() {
        let values: Vec<f64> = noise(200, 3).iter().map(|e| 5.0 + e).collect();
        let mut model = model_from(values, 12);
        model.set_mean(true);

        let est = estimate(&model, Precision::intermediate()).unwrap();
        assert_eq!(est.coefficient_names, vec!["mean"]);
        assert_relative_eq!(est.coefficients[0], 5.0, epsilon = 0.3);
        assert!(est.coefficient_tstats[0] > 10.0);
    }

    #[test]
    fn airline_fit_on_simulated_airline_series() {
        // simulate (0,1,1)(0,1,1)_12 and recover negative MA parameters
        let n = 160;
        let e = noise(n + 13, 42);
        let (theta, btheta) = (-0.4, -0.6);
        let mut w = vec![0.0; n];
        for t in 0..n {
            let i = t + 13;
            w[t] = e[i] + theta * e[i - 1] + btheta * e[i - 12] + theta * btheta * e[i - 13];
        }
        // integrate regular and seasonal differences
        let mut y = vec![0.0; n];
        for t in 0..n {
            let prev = if t >= 1 { y[t - 1] } else { 0.0 };
            let seasonal = if t >= 12 { y[t - 12] } else { 0.0 };
            let prev_both = if t >= 13 { y[t - 13] } else { 0.0 };
            y[t] = w[t] + prev + seasonal - prev_both;
        }
        let mut model = model_from(y, 12);
        model.set_orders(SarimaOrders::airline(true));

        let est = estimate(&model, Precision::exact()).unwrap();
        assert_relative_eq!(est.parameters[0], theta, epsilon = 0.15);
        assert_relative_eq!(est.parameters[1], btheta, epsilon = 0.15);
    }

    #[test]
    fn insufficient_data_is_reported() {
        let mut model = model_from(vec![1.0; 10], 12);
        model.set_orders(SarimaOrders::airline(true));
        assert!(matches!(
            estimate(&model, Precision::intermediate()),
            Err(RegArimaError::InsufficientData { .. })
        ));
    }

    #[test]
    fn short_user_column_is_a_dimension_mismatch() {
        let mut model = model_from(noise(120, 23), 12);
        model.add_variable(crate::model::variables::Variable::user(
            "temperature",
            vec![vec![1.0; 10]],
        ));
        assert_eq!(
            estimate(&model, Precision::intermediate()),
            Err(RegArimaError::DimensionMismatch {
                expected: 120,
                got: 10
            })
        );
    }

    #[test]
    fn bic_penalizes_extra_parameters() {
        let values = noise(200, 11);
        let mut white = model_from(values.clone(), 12);
        white.set_mean(true);
        let small = estimate(&white, Precision::intermediate()).unwrap();

        let mut bigger = model_from(values, 12);
        bigger.set_mean(true);
        bigger.set_orders(SarimaOrders {
            p: 2,
            q: 2,
            ..SarimaOrders::none()
        });
        let large = estimate(&bigger, Precision::intermediate()).unwrap();

        assert!(small.bic() < large.bic());
    }
}
