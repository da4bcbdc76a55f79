//! Significance testing of the regression part.
//!
//! Calendar effects are tested jointly, the Easter effect and the mean by
//! their t statistics. Testers only touch variables the caller did not
//! prespecify.

use nalgebra::{DMatrix, DVector};

use crate::ami::ProcessingResult;
use crate::estimation::estimator::{estimate, Estimation, Precision};
use crate::model::variables::{Variable, VariableRole};
use crate::model::ModelDescription;
use crate::stats::tests::{chi_squared_sf, f_p_value};

/// A component that adds or removes regression variables based on their
/// estimated significance.
pub trait RegressionTester {
    fn process(&self, model: &mut ModelDescription) -> ProcessingResult;
}

/// Joint-test flavor used by the automatic calendar tester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointTestKind {
    /// F test with the residual degrees of freedom.
    F,
    /// Wald chi-squared test.
    Wald,
}

/// Keeps each tested variable only when its strongest column passes a
/// fixed t threshold.
#[derive(Debug, Clone)]
pub struct DefaultThresholdTester {
    pub t_limit: f64,
    pub t_mean: f64,
    pub precision: Precision,
}

impl RegressionTester for DefaultThresholdTester {
    fn process(&self, model: &mut ModelDescription) -> ProcessingResult {
        let Some(estimation) = current_estimation(model, self.precision) else {
            return ProcessingResult::Failed;
        };

        let mut to_remove = Vec::new();
        for variable in model.variables() {
            if variable.prespecified || !is_testable(variable) {
                continue;
            }
            if max_abs_tstat(&estimation, variable) < self.t_limit {
                to_remove.push(variable.name.clone());
            }
        }
        let mut changed = false;
        for name in to_remove {
            changed |= model.remove_variable(&name);
        }
        changed |= drop_insignificant_mean(model, &estimation, self.t_mean);
        outcome(changed)
    }
}

/// Chooses between the six-contrast trading-day set, the single
/// working-day contrast, or no calendar effect at all, by whichever joint
/// test is most significant; then tests Easter and, conditional on an
/// accepted calendar effect, the leap-year correction.
#[derive(Debug, Clone)]
pub struct AutomaticCalendarTester {
    pub kind: JointTestKind,
    pub td_p_value: f64,
    pub t_easter: f64,
    pub t_mean: f64,
    /// Whether a leap-year correction is offered once a calendar effect
    /// is in the model.
    pub leap_year: bool,
    pub precision: Precision,
}

impl AutomaticCalendarTester {
    /// Joint p-value of the named variable in a trial fit carrying it.
    fn trial_p_value(&self, model: &ModelDescription, variable: Variable) -> Option<f64> {
        let mut trial = model.clone();
        trial.remove_variable("td");
        trial.remove_variable("wd");
        trial.add_variable(variable.clone());
        let estimation = estimate(&trial, self.precision).ok()?;
        joint_p_value(self.kind, &estimation, &variable)
    }
}

impl RegressionTester for AutomaticCalendarTester {
    fn process(&self, model: &mut ModelDescription) -> ProcessingResult {
        let prespecified_days = model
            .variables()
            .iter()
            .any(|v| v.prespecified && matches!(v.role, VariableRole::TradingDays | VariableRole::WorkingDays));

        let mut changed = false;
        if !prespecified_days {
            let p_td = self.trial_p_value(model, Variable::trading_days());
            let p_wd = self.trial_p_value(model, Variable::working_days());

            let winner = match (p_td, p_wd) {
                (Some(td), Some(wd)) if td <= wd && td < self.td_p_value => Some(Variable::trading_days()),
                (Some(_), Some(wd)) if wd < self.td_p_value => Some(Variable::working_days()),
                (Some(td), None) if td < self.td_p_value => Some(Variable::trading_days()),
                (None, Some(wd)) if wd < self.td_p_value => Some(Variable::working_days()),
                _ => None,
            };

            match winner {
                Some(variable) => {
                    let other = if variable.name == "td" { "wd" } else { "td" };
                    if model.variable(&variable.name).is_none() || model.variable(other).is_some() {
                        model.remove_variable("td");
                        model.remove_variable("wd");
                        model.add_variable(variable);
                        changed = true;
                    }
                }
                None => {
                    changed |= model.remove_variable("td");
                    changed |= model.remove_variable("wd");
                }
            }
        }

        // leap year rides with the calendar effect, never alone
        if model.variable("lp").is_some() && !model.has_calendar_days() {
            changed |= model.remove_variable("lp");
        }
        let mut lp_trial = false;
        if self.leap_year
            && !model.log()
            && model.frequency() == 12
            && model.has_calendar_days()
            && model.variable("lp").is_none()
        {
            model.add_variable(Variable::leap_year());
            lp_trial = true;
        }

        let Some(estimation) = current_estimation(model, self.precision) else {
            return ProcessingResult::Failed;
        };
        if let Some(variable) = model.variable("easter").cloned() {
            if !variable.prespecified && max_abs_tstat(&estimation, &variable) < self.t_easter {
                changed |= model.remove_variable("easter");
            }
        }
        if let Some(variable) = model.variable("lp").cloned() {
            if !variable.prespecified && max_abs_tstat(&estimation, &variable) < 1.96 {
                model.remove_variable("lp");
                // a rejected trial column is no net change
                changed |= !lp_trial;
            } else {
                changed |= lp_trial;
            }
        }
        changed |= drop_insignificant_mean(model, &estimation, self.t_mean);
        outcome(changed)
    }
}

/// Terminal one-shot prune: drops every insignificant tested variable,
/// detected outliers included, without re-fitting between removals.
#[derive(Debug, Clone)]
pub struct FastPruneTester {
    pub t_limit: f64,
    pub precision: Precision,
}

impl RegressionTester for FastPruneTester {
    fn process(&self, model: &mut ModelDescription) -> ProcessingResult {
        let Some(estimation) = current_estimation(model, self.precision) else {
            return ProcessingResult::Failed;
        };
        let mut to_remove = Vec::new();
        for variable in model.variables() {
            if variable.prespecified {
                continue;
            }
            let tested = is_testable(variable) || variable.is_outlier();
            if tested && max_abs_tstat(&estimation, variable) < self.t_limit {
                to_remove.push(variable.name.clone());
            }
        }
        let mut changed = false;
        for name in to_remove {
            changed |= model.remove_variable(&name);
        }
        changed |= drop_insignificant_mean(model, &estimation, self.t_limit);
        outcome(changed)
    }
}

fn outcome(changed: bool) -> ProcessingResult {
    if changed {
        ProcessingResult::Changed
    } else {
        ProcessingResult::Unchanged
    }
}

fn is_testable(variable: &Variable) -> bool {
    matches!(
        variable.role,
        VariableRole::TradingDays
            | VariableRole::WorkingDays
            | VariableRole::LeapYear
            | VariableRole::Easter
    )
}

fn current_estimation(model: &mut ModelDescription, precision: Precision) -> Option<Estimation> {
    if model.is_stale() {
        let estimation = estimate(model, precision).ok()?;
        model.set_estimation(estimation);
    }
    model.estimation().cloned()
}

fn drop_insignificant_mean(
    model: &mut ModelDescription,
    estimation: &Estimation,
    t_limit: f64,
) -> bool {
    if !model.mean() {
        return false;
    }
    match estimation.coefficient_tstat("mean") {
        Some(t) if t.abs() < t_limit => {
            model.set_mean(false);
            true
        }
        _ => false,
    }
}

/// Column indices of a variable in the estimation's design.
fn variable_indices(estimation: &Estimation, variable: &Variable) -> Vec<usize> {
    let prefix = format!("{}.", variable.name);
    estimation
        .coefficient_names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            if variable.dimension() > 1 {
                name.starts_with(&prefix)
            } else {
                *name == &variable.name
            }
        })
        .map(|(i, _)| i)
        .collect()
}

fn max_abs_tstat(estimation: &Estimation, variable: &Variable) -> f64 {
    variable_indices(estimation, variable)
        .iter()
        .map(|&i| estimation.coefficient_tstats[i].abs())
        .fold(0.0, f64::max)
}

/// Wald statistic `b' V^{-1} b` of the variable's coefficient block.
fn wald_statistic(estimation: &Estimation, indices: &[usize]) -> Option<f64> {
    let k = indices.len();
    if k == 0 {
        return None;
    }
    let covariance = DMatrix::from_fn(k, k, |i, j| {
        estimation.coefficient_covariance[indices[i]][indices[j]]
    });
    let b = DVector::from_fn(k, |i, _| estimation.coefficients[indices[i]]);
    let chol = covariance.cholesky()?;
    Some((b.transpose() * chol.solve(&b))[(0, 0)])
}

fn joint_p_value(kind: JointTestKind, estimation: &Estimation, variable: &Variable) -> Option<f64> {
    let indices = variable_indices(estimation, variable);
    let statistic = wald_statistic(estimation, &indices)?;
    let k = indices.len();
    Some(match kind {
        JointTestKind::F => f_p_value(statistic / k as f64, k, estimation.dof),
        JointTestKind::Wald => chi_squared_sf(statistic, k as f64),
    })
}
