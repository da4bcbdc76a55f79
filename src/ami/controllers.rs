//! Structural second opinions on the identified model.
//!
//! Each controller proposes one targeted change, re-estimates, and keeps
//! the change only when the comparator prefers the result; otherwise the
//! working model is restored from its snapshot untouched.

use crate::ami::comparator::{Assessment, ModelComparator};
use crate::ami::ProcessingResult;
use crate::estimation::estimator::{estimate, split_parameters, Precision};
use crate::estimation::roots::inverse_roots;
use crate::model::orders::{SarimaOrders, MAX_BD, MAX_D};
use crate::model::variables::Variable;
use crate::model::ModelDescription;

/// A component that challenges the identified structure with an
/// alternative and keeps whichever the comparator prefers.
pub trait ModelController {
    fn process(
        &self,
        model: &mut ModelDescription,
        comparator: &ModelComparator,
    ) -> ProcessingResult;
}

/// Estimate if stale; `false` means estimation failed.
fn ensure_estimated(model: &mut ModelDescription, precision: Precision) -> bool {
    if model.is_stale() {
        match estimate(model, precision) {
            Ok(estimation) => model.set_estimation(estimation),
            Err(_) => return false,
        }
    }
    true
}

/// Apply a change, re-estimate, and roll back unless the change keeps the
/// residuals white. The differencing evidence itself (the offending root)
/// justifies the change; whiteness is only a veto.
fn apply_unless_whiteness_breaks(
    model: &mut ModelDescription,
    comparator: &ModelComparator,
    precision: Precision,
    change: impl FnOnce(&mut ModelDescription),
) -> ProcessingResult {
    if !ensure_estimated(model, precision) {
        return ProcessingResult::Failed;
    }
    let was_acceptable = comparator.is_acceptable(model) == Some(true);
    let snapshot = model.clone();
    change(model);
    if !ensure_estimated(model, precision) {
        *model = snapshot;
        return ProcessingResult::Unchanged;
    }
    if was_acceptable && comparator.is_acceptable(model) == Some(false) {
        *model = snapshot;
        return ProcessingResult::Unchanged;
    }
    ProcessingResult::Changed
}

/// Apply a change, re-estimate, and roll back unless the comparator
/// prefers the changed model.
fn challenge(
    model: &mut ModelDescription,
    comparator: &ModelComparator,
    precision: Precision,
    change: impl FnOnce(&mut ModelDescription),
) -> ProcessingResult {
    if !ensure_estimated(model, precision) {
        return ProcessingResult::Failed;
    }
    let snapshot = model.clone();
    change(model);
    if !ensure_estimated(model, precision) {
        *model = snapshot;
        return ProcessingResult::Unchanged;
    }
    if comparator.compare(model, &snapshot) == Assessment::PreferCandidate {
        ProcessingResult::Changed
    } else {
        *model = snapshot;
        ProcessingResult::Unchanged
    }
}

/// Challenges the identified model with the plain airline specification.
#[derive(Debug, Clone)]
pub struct BenchmarkController {
    pub seasonal: bool,
    pub precision: Precision,
}

impl ModelController for BenchmarkController {
    fn process(
        &self,
        model: &mut ModelDescription,
        comparator: &ModelComparator,
    ) -> ProcessingResult {
        let airline = SarimaOrders::airline(self.seasonal);
        if model.orders() == airline {
            return ProcessingResult::Unprocessed;
        }
        if !ensure_estimated(model, self.precision) {
            return ProcessingResult::Failed;
        }
        // the benchmark is a rescue, not a rival: an adequate model stands
        if comparator.is_acceptable(model) == Some(true) {
            return ProcessingResult::Unchanged;
        }
        challenge(model, comparator, self.precision, |m| {
            m.set_orders(airline);
            m.set_mean(false);
        })
    }
}

/// Converts a large positive regular AR root into one more regular
/// difference.
#[derive(Debug, Clone)]
pub struct RegularUnderDifferencingController {
    pub root_limit: f64,
    pub precision: Precision,
}

impl ModelController for RegularUnderDifferencingController {
    fn process(
        &self,
        model: &mut ModelDescription,
        comparator: &ModelComparator,
    ) -> ProcessingResult {
        if !ensure_estimated(model, self.precision) {
            return ProcessingResult::Failed;
        }
        let orders = model.orders();
        if orders.p == 0 || orders.d >= MAX_D {
            return ProcessingResult::Unprocessed;
        }
        let Some(estimation) = model.estimation() else {
            return ProcessingResult::Failed;
        };
        let (phi, _, _, _) = split_parameters(orders, &estimation.parameters);
        let negated: Vec<f64> = phi.iter().map(|c| -c).collect();
        let suspicious = inverse_roots(&negated)
            .iter()
            .any(|r| r.re > 0.0 && r.im.abs() < 0.05 && r.modulus() > self.root_limit);
        if !suspicious {
            return ProcessingResult::Unchanged;
        }
        apply_unless_whiteness_breaks(model, comparator, self.precision, |m| {
            let mut next = m.orders();
            next.p -= 1;
            next.d += 1;
            m.set_orders(next);
            m.set_mean(false);
        })
    }
}

/// Converts a large seasonal AR coefficient into a seasonal difference.
#[derive(Debug, Clone)]
pub struct SeasonalUnderDifferencingController {
    pub root_limit: f64,
    pub precision: Precision,
}

impl ModelController for SeasonalUnderDifferencingController {
    fn process(
        &self,
        model: &mut ModelDescription,
        comparator: &ModelComparator,
    ) -> ProcessingResult {
        if !ensure_estimated(model, self.precision) {
            return ProcessingResult::Failed;
        }
        let orders = model.orders();
        if orders.bp == 0 || orders.bd >= MAX_BD {
            return ProcessingResult::Unprocessed;
        }
        let Some(estimation) = model.estimation() else {
            return ProcessingResult::Failed;
        };
        let (_, bphi, _, _) = split_parameters(orders, &estimation.parameters);
        if bphi[0] <= self.root_limit {
            return ProcessingResult::Unchanged;
        }
        apply_unless_whiteness_breaks(model, comparator, self.precision, |m| {
            let mut next = m.orders();
            next.bp -= 1;
            next.bd += 1;
            m.set_orders(next);
            m.set_mean(false);
        })
    }
}

/// Offers the six trading-day contrasts, then the single working-day
/// contrast, to a model that ended up with no calendar effect. A
/// candidate stays only when one of its estimates is significant and
/// the comparator prefers the augmented fit.
#[derive(Debug, Clone)]
pub struct TradingDaysActivationController {
    pub t_limit: f64,
    pub precision: Precision,
}

impl TradingDaysActivationController {
    fn is_significant(&self, model: &ModelDescription, candidate: &Variable) -> bool {
        let prefix = format!("{}.", candidate.name);
        model.estimation().is_some_and(|estimation| {
            estimation
                .coefficient_names
                .iter()
                .zip(&estimation.coefficient_tstats)
                .any(|(name, tstat)| {
                    (*name == candidate.name || name.starts_with(&prefix))
                        && tstat.abs() > self.t_limit
                })
        })
    }
}

impl ModelController for TradingDaysActivationController {
    fn process(
        &self,
        model: &mut ModelDescription,
        comparator: &ModelComparator,
    ) -> ProcessingResult {
        if model.has_calendar_days() || model.frequency() != 12 {
            return ProcessingResult::Unprocessed;
        }
        if !ensure_estimated(model, self.precision) {
            return ProcessingResult::Failed;
        }
        let snapshot = model.clone();
        for candidate in [Variable::trading_days(), Variable::working_days()] {
            model.add_variable(candidate.clone());
            if !ensure_estimated(model, self.precision) {
                *model = snapshot.clone();
                continue;
            }
            if self.is_significant(model, &candidate)
                && comparator.compare(model, &snapshot) == Assessment::PreferCandidate
            {
                return ProcessingResult::Changed;
            }
            *model = snapshot.clone();
        }
        ProcessingResult::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn under_differencing_is_repaired_on_a_random_walk() {
        let e = noise(240, 31);
        let mut values = vec![0.0; 240];
        values[0] = e[0];
        for t in 1..240 {
            values[t] = values[t - 1] + e[t];
        }
        let mut model = ModelDescription::new(values, 12, (2004, 0), false);
        model.set_orders(SarimaOrders {
            p: 1,
            ..SarimaOrders::none()
        });

        let controller = RegularUnderDifferencingController {
            root_limit: 0.90,
            precision: Precision::intermediate(),
        };
        let result = controller.process(&mut model, &ModelComparator::new(0.95));
        assert_eq!(result, ProcessingResult::Changed);
        assert_eq!(model.orders().d, 1);
        assert_eq!(model.orders().p, 0);
        assert!(!model.mean());
    }

    #[test]
    fn stationary_model_is_not_touched() {
        let e = noise(240, 33);
        let mut values = vec![0.0; 240];
        values[0] = e[0];
        for t in 1..240 {
            values[t] = 0.5 * values[t - 1] + e[t];
        }
        let mut model = ModelDescription::new(values, 12, (2004, 0), false);
        model.set_orders(SarimaOrders {
            p: 1,
            ..SarimaOrders::none()
        });

        let controller = RegularUnderDifferencingController {
            root_limit: 0.90,
            precision: Precision::intermediate(),
        };
        let result = controller.process(&mut model, &ModelComparator::new(0.95));
        assert_eq!(result, ProcessingResult::Unchanged);
        assert_eq!(model.orders().p, 1);
        assert_eq!(model.orders().d, 0);
    }

    #[test]
    fn benchmark_declines_when_already_airline() {
        let mut model = ModelDescription::new(noise(180, 35), 12, (2004, 0), false);
        model.set_orders(SarimaOrders::airline(true));
        let controller = BenchmarkController {
            seasonal: true,
            precision: Precision::intermediate(),
        };
        let result = controller.process(&mut model, &ModelComparator::new(0.95));
        assert_eq!(result, ProcessingResult::Unprocessed);
    }

    #[test]
    fn activation_outcome_matches_the_model_state() {
        let mut model = ModelDescription::new(noise(240, 37), 12, (2004, 0), false);
        let controller = TradingDaysActivationController {
            t_limit: 1.96,
            precision: Precision::intermediate(),
        };
        let result = controller.process(&mut model, &ModelComparator::new(0.95));
        match result {
            ProcessingResult::Changed => assert!(model.has_calendar_days()),
            ProcessingResult::Unchanged => assert!(!model.has_calendar_days()),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn injected_trading_day_effect_activates_the_full_contrast_set() {
        // each weekday contrast gets its own coefficient, so the
        // six-column set should win over the single working-day column
        let base = ModelDescription::new(noise(240, 39), 12, (2004, 0), false);
        let td = base.variable_columns(&Variable::trading_days());
        let series: Vec<f64> = base
            .series()
            .iter()
            .enumerate()
            .map(|(t, v)| v + 1.2 * td[0][t] - 0.9 * td[3][t])
            .collect();
        let mut model = ModelDescription::new(series, 12, (2004, 0), false);
        let controller = TradingDaysActivationController {
            t_limit: 1.96,
            precision: Precision::intermediate(),
        };
        let result = controller.process(&mut model, &ModelComparator::new(0.95));
        assert_eq!(result, ProcessingResult::Changed);
        assert!(model.has_calendar_days());
        assert!(model.variable("td").is_some());
        assert!(model.variable("wd").is_none());
    }

    #[test]
    fn rejected_contrast_is_removed_before_the_next_trial() {
        let mut model = ModelDescription::new(noise(240, 41), 12, (2004, 0), false);
        let controller = TradingDaysActivationController {
            t_limit: 1.96,
            precision: Precision::intermediate(),
        };
        let result = controller.process(&mut model, &ModelComparator::new(0.95));
        let contrasts = model
            .variables()
            .iter()
            .filter(|v| v.name == "td" || v.name == "wd")
            .count();
        match result {
            ProcessingResult::Changed => assert_eq!(contrasts, 1),
            ProcessingResult::Unchanged => assert_eq!(contrasts, 0),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
