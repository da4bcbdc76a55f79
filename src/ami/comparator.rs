//! Comparison of a candidate model against the reference model.

use crate::model::ModelDescription;
use crate::stats::tests::ljung_box;

/// Slack granted to a candidate whose structure matches the airline
/// specification: a near-canonical model may be preferred even when its
/// residual scale is marginally worse.
const QUASI_AIRLINE_SLACK: f64 = 1.025;

/// Verdict of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    PreferCandidate,
    PreferReference,
}

/// Ranks two fitted models by parsimony of the outlier set first, residual
/// whiteness second, and residual scale last.
#[derive(Debug, Clone)]
pub struct ModelComparator {
    ljung_box_limit: f64,
}

impl ModelComparator {
    pub fn new(ljung_box_limit: f64) -> Self {
        Self { ljung_box_limit }
    }

    /// Whether the model's residuals pass the portmanteau screen at the
    /// current limit. `None` when the model carries no estimation.
    pub fn is_acceptable(&self, model: &ModelDescription) -> Option<bool> {
        let estimation = model.estimation()?;
        let arma = model.orders().free_parameters();
        let result = ljung_box(&estimation.residuals, None, arma);
        Some(1.0 - result.p_value < self.ljung_box_limit)
    }

    pub fn compare(
        &self,
        candidate: &ModelDescription,
        reference: &ModelDescription,
    ) -> Assessment {
        let (Some(ce), Some(re)) = (candidate.estimation(), reference.estimation()) else {
            return if candidate.estimation().is_some() {
                Assessment::PreferCandidate
            } else {
                Assessment::PreferReference
            };
        };

        // a leaner outlier set is never worse
        let candidate_outliers = candidate.estimated_outlier_count();
        let reference_outliers = reference.estimated_outlier_count();
        if candidate_outliers < reference_outliers {
            return Assessment::PreferCandidate;
        }
        if candidate_outliers > reference_outliers {
            return Assessment::PreferReference;
        }

        // a quasi-airline candidate (regular or seasonal part) is not
        // rejected on whiteness alone; it falls through to the scale check
        let quasi_airline = candidate.orders().has_airline_regular_part()
            || candidate.orders().has_airline_seasonal_part();
        match (self.is_acceptable(candidate), self.is_acceptable(reference)) {
            (Some(true), Some(false)) => return Assessment::PreferCandidate,
            (Some(false), Some(true)) if !quasi_airline => {
                return Assessment::PreferReference
            }
            _ => {}
        }

        let slack = if quasi_airline {
            QUASI_AIRLINE_SLACK
        } else {
            1.0
        };
        if ce.sigma() < slack * re.sigma() {
            Assessment::PreferCandidate
        } else {
            Assessment::PreferReference
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::estimator::{estimate, Estimation, Precision};
    use crate::model::orders::SarimaOrders;
    use crate::model::variables::{OutlierKind, Variable};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    fn fitted(values: Vec<f64>, orders: SarimaOrders) -> ModelDescription {
        let mut model = ModelDescription::new(values, 12, (2005, 0), false);
        model.set_orders(orders);
        let estimation = estimate(&model, Precision::intermediate()).unwrap();
        model.set_estimation(estimation);
        model
    }

    #[test]
    fn white_residuals_are_acceptable() {
        let model = fitted(noise(200, 3), SarimaOrders::none());
        let comparator = ModelComparator::new(0.95);
        assert_eq!(comparator.is_acceptable(&model), Some(true));
    }

    #[test]
    fn correlated_residuals_are_rejected() {
        // strong AR(1) left unmodelled
        let e = noise(300, 5);
        let mut values = vec![0.0; 300];
        values[0] = e[0];
        for t in 1..300 {
            values[t] = 0.8 * values[t - 1] + e[t];
        }
        let model = fitted(values, SarimaOrders::none());
        let comparator = ModelComparator::new(0.95);
        assert_eq!(comparator.is_acceptable(&model), Some(false));
    }

    #[test]
    fn whiteness_decides_between_equally_lean_models() {
        let e = noise(300, 7);
        let mut values = vec![0.0; 300];
        values[0] = e[0];
        for t in 1..300 {
            values[t] = 0.8 * values[t - 1] + e[t];
        }
        let white = fitted(
            values.clone(),
            SarimaOrders {
                p: 1,
                ..SarimaOrders::none()
            },
        );
        let colored = fitted(values, SarimaOrders::none());

        let comparator = ModelComparator::new(0.95);
        assert_eq!(comparator.compare(&white, &colored), Assessment::PreferCandidate);
        assert_eq!(comparator.compare(&colored, &white), Assessment::PreferReference);
    }

    #[test]
    fn fewer_outliers_break_whiteness_ties() {
        let values = noise(200, 11);
        let lean = fitted(values.clone(), SarimaOrders::none());
        let mut heavy = ModelDescription::new(values, 12, (2005, 0), false);
        heavy.add_variable(Variable::outlier(OutlierKind::Additive, 50));
        heavy.add_variable(Variable::outlier(OutlierKind::Additive, 90));
        let estimation = estimate(&heavy, Precision::intermediate()).unwrap();
        heavy.set_estimation(estimation);

        let comparator = ModelComparator::new(0.95);
        assert_eq!(comparator.compare(&lean, &heavy), Assessment::PreferCandidate);
    }

    #[test]
    fn fewer_outliers_win_even_against_whiter_residuals() {
        // strong AR(1): the bare fit is lean but colored, the reference
        // models the dependence and carries two outliers on top
        let e = noise(300, 17);
        let mut values = vec![0.0; 300];
        values[0] = e[0];
        for t in 1..300 {
            values[t] = 0.8 * values[t - 1] + e[t];
        }
        let colored_lean = fitted(values.clone(), SarimaOrders::none());
        let mut white_heavy = ModelDescription::new(values, 12, (2005, 0), false);
        white_heavy.set_orders(SarimaOrders {
            p: 1,
            ..SarimaOrders::none()
        });
        white_heavy.add_variable(Variable::outlier(OutlierKind::Additive, 50));
        white_heavy.add_variable(Variable::outlier(OutlierKind::Additive, 90));
        let estimation = estimate(&white_heavy, Precision::intermediate()).unwrap();
        white_heavy.set_estimation(estimation);

        let comparator = ModelComparator::new(0.95);
        assert_eq!(comparator.is_acceptable(&colored_lean), Some(false));
        assert_eq!(comparator.is_acceptable(&white_heavy), Some(true));
        assert_eq!(
            comparator.compare(&colored_lean, &white_heavy),
            Assessment::PreferCandidate
        );
    }

    #[test]
    fn quasi_seasonal_airline_candidate_keeps_its_slack() {
        let white = noise(200, 19);
        let e = noise(200, 23);
        let mut colored = vec![0.0; 200];
        colored[0] = e[0];
        for t in 1..200 {
            colored[t] = 0.8 * colored[t - 1] + e[t];
        }

        let fake_fit = |residuals: Vec<f64>| Estimation {
            residuals,
            ssq: 100.0,
            dof: 100,
            ..Estimation::empty_for_tests()
        };

        let mut reference = ModelDescription::new(white.clone(), 12, (2005, 0), false);
        reference.set_orders(SarimaOrders {
            p: 1,
            ..SarimaOrders::none()
        });
        reference.set_estimation(fake_fit(white.clone()));

        // seasonal airline part: marginally non-white, equal scale
        let mut candidate = ModelDescription::new(white.clone(), 12, (2005, 0), false);
        candidate.set_orders(SarimaOrders {
            p: 1,
            bd: 1,
            bq: 1,
            ..SarimaOrders::none()
        });
        candidate.set_estimation(fake_fit(colored.clone()));

        let comparator = ModelComparator::new(0.95);
        assert_eq!(comparator.is_acceptable(&candidate), Some(false));
        assert_eq!(
            comparator.compare(&candidate, &reference),
            Assessment::PreferCandidate
        );

        // without the airline structure the whiteness verdict is final
        let mut plain = ModelDescription::new(white, 12, (2005, 0), false);
        plain.set_orders(SarimaOrders {
            p: 1,
            ..SarimaOrders::none()
        });
        plain.set_estimation(fake_fit(colored));
        assert_eq!(
            comparator.compare(&plain, &reference),
            Assessment::PreferReference
        );
    }

    #[test]
    fn unestimated_candidate_loses() {
        let values = noise(200, 13);
        let reference = fitted(values.clone(), SarimaOrders::none());
        let stale = ModelDescription::new(values, 12, (2005, 0), false);

        let comparator = ModelComparator::new(0.95);
        assert_eq!(comparator.compare(&stale, &reference), Assessment::PreferReference);
    }
}
