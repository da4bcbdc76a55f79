//! Post-identification cleanup of the estimated model.
//!
//! After the identification loop settles on a specification, the final
//! estimator re-examines the fitted lag polynomials: near-unit autoregressive
//! roots are absorbed into the differencing orders, near-common AR/MA root
//! pairs are cancelled, and insignificant top-lag parameters are pruned.
//! Each simplification triggers a re-estimation, up to a small pass cap.

use crate::ami::ProcessingResult;
use crate::estimation::estimator::{estimate, split_parameters, Estimation, Precision};
use crate::estimation::roots::{inverse_roots, InverseRoot};
use crate::model::orders::{MAX_BD, MAX_D};
use crate::model::ModelDescription;

const MAX_PASSES: usize = 5;

/// Cleanup of the final fitted model.
#[derive(Debug, Clone)]
pub struct FinalEstimator {
    precision: Precision,
    /// Structural simplification is only applied in automatic mode.
    automatic: bool,
    unit_root_limit: f64,
    cancel_limit: f64,
    tsig: f64,
}

impl FinalEstimator {
    pub fn new(precision: Precision, automatic: bool) -> Self {
        Self {
            precision,
            automatic,
            unit_root_limit: 0.96,
            cancel_limit: 0.044,
            tsig: 1.0,
        }
    }

    pub fn with_unit_root_limit(mut self, limit: f64) -> Self {
        self.unit_root_limit = limit;
        self
    }

    pub fn with_cancel_limit(mut self, limit: f64) -> Self {
        self.cancel_limit = limit;
        self
    }

    pub fn with_tsig(mut self, tsig: f64) -> Self {
        self.tsig = tsig;
        self
    }

    /// Estimate the model and simplify its ARMA structure in place.
    ///
    /// Any return other than `Failed` leaves a current estimation on the
    /// model; hitting the pass cap settles on one last plain fit.
    pub fn process(&self, model: &mut ModelDescription) -> ProcessingResult {
        let mut changed = false;
        for pass in 0..=MAX_PASSES {
            if model.is_stale() {
                match estimate(model, self.precision) {
                    Ok(estimation) => model.set_estimation(estimation),
                    Err(_) => return ProcessingResult::Failed,
                }
            }
            if !self.automatic || pass == MAX_PASSES {
                break;
            }
            let estimation = match model.estimation() {
                Some(estimation) => estimation.clone(),
                None => return ProcessingResult::Failed,
            };
            if !self.simplify_once(model, &estimation) {
                break;
            }
            changed = true;
        }
        if changed {
            ProcessingResult::Changed
        } else {
            ProcessingResult::Unchanged
        }
    }

    /// Apply at most one structural simplification. Returns true when the
    /// model was changed (and invalidated).
    fn simplify_once(&self, model: &mut ModelDescription, estimation: &Estimation) -> bool {
        let orders = model.orders();
        let (phi, bphi, theta, btheta) = split_parameters(orders, &estimation.parameters);

        let ar_roots = inverse_roots(&negate(phi));
        let ma_roots = inverse_roots(&theta.to_vec());

        // near-unit regular AR root absorbed into the differencing order
        if orders.d < MAX_D {
            let unit = ar_roots.iter().any(|r| {
                r.modulus() > self.unit_root_limit && r.re > 0.0 && r.im.abs() < 0.05
            });
            if unit {
                let mut next = orders;
                next.p -= 1;
                next.d += 1;
                model.set_orders(next);
                model.set_mean(false);
                return true;
            }
        }

        // near-unit seasonal AR absorbed into the seasonal differencing order
        if orders.bp > 0 && orders.bd < MAX_BD && bphi[0] > self.unit_root_limit {
            let mut next = orders;
            next.bp -= 1;
            next.bd += 1;
            model.set_orders(next);
            model.set_mean(false);
            return true;
        }

        // regular common-root cancellation
        if orders.p > 0 && orders.q > 0 && nearest_pair(&ar_roots, &ma_roots) < self.cancel_limit {
            let mut next = orders;
            next.p -= 1;
            next.q -= 1;
            model.set_orders(next);
            return true;
        }

        // seasonal cancellation: 1 - bphi B^s against 1 + btheta B^s
        if orders.bp > 0 && orders.bq > 0 && (bphi[0] + btheta[0]).abs() < self.cancel_limit {
            let mut next = orders;
            next.bp -= 1;
            next.bq -= 1;
            model.set_orders(next);
            return true;
        }

        self.prune_top_lag(model, estimation)
    }

    /// Drop the highest-lag parameter of a polynomial when its estimate is
    /// both small and insignificant.
    fn prune_top_lag(&self, model: &mut ModelDescription, estimation: &Estimation) -> bool {
        let orders = model.orders();
        let n = model.span().len();
        let small = if n <= 150 { 0.15 } else { 0.10 };

        let (phi, bphi, theta, btheta) = split_parameters(orders, &estimation.parameters);
        let tstats = &estimation.parameter_tstats;
        let negligible = |offset: usize, value: f64| {
            value.abs() < small && tstats.get(offset).is_some_and(|t| t.abs() < self.tsig)
        };

        if orders.p > 0 && negligible(orders.p - 1, phi[orders.p - 1]) {
            let mut next = orders;
            next.p -= 1;
            model.set_orders(next);
            return true;
        }
        if orders.bp > 0 && negligible(orders.p + orders.bp - 1, bphi[orders.bp - 1]) {
            let mut next = orders;
            next.bp -= 1;
            model.set_orders(next);
            return true;
        }
        if orders.q > 0 && negligible(orders.p + orders.bp + orders.q - 1, theta[orders.q - 1]) {
            let mut next = orders;
            next.q -= 1;
            model.set_orders(next);
            return true;
        }
        if orders.bq > 0
            && negligible(
                orders.p + orders.bp + orders.q + orders.bq - 1,
                btheta[orders.bq - 1],
            )
        {
            let mut next = orders;
            next.bq -= 1;
            model.set_orders(next);
            return true;
        }
        false
    }
}

fn negate(coeffs: &[f64]) -> Vec<f64> {
    coeffs.iter().map(|c| -c).collect()
}

fn nearest_pair(a: &[InverseRoot], b: &[InverseRoot]) -> f64 {
    let mut best = f64::MAX;
    for ra in a {
        for rb in b {
            best = best.min(ra.distance(rb));
        }
    }
    best
}
