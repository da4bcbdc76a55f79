//! ARMA order identification by information criterion.

use crate::ami::ProcessingResult;
use crate::estimation::estimator::{estimate, Precision};
use crate::model::orders::SarimaOrders;
use crate::model::ModelDescription;

/// Regular (p, q) candidates, searched in increasing complexity.
const REGULAR_CANDIDATES: [(usize, usize); 9] = [
    (0, 0),
    (0, 1),
    (1, 0),
    (1, 1),
    (0, 2),
    (2, 0),
    (2, 1),
    (1, 2),
    (2, 2),
];

/// Seasonal (bp, bq) candidates.
const SEASONAL_CANDIDATES: [(usize, usize); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];

/// Chooses the ARMA orders that minimize the Schwarz criterion, holding the
/// differencing orders and the regression fixed.
///
/// The regular and seasonal parts are searched jointly over a small grid;
/// each candidate is fitted at intermediate precision.
#[derive(Debug, Clone)]
pub struct OrderSelector {
    precision: Precision,
}

impl OrderSelector {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    /// Identify the best orders for the model's current structure.
    ///
    /// `force_moving_average` replaces a pure-noise winner with an MA(1),
    /// which keeps late identification passes from collapsing onto white
    /// noise.
    pub fn process(
        &self,
        model: &mut ModelDescription,
        seasonal: bool,
        force_moving_average: bool,
    ) -> ProcessingResult {
        let current = model.orders();
        let seasonal_pairs: &[(usize, usize)] = if seasonal && model.frequency() > 1 {
            &SEASONAL_CANDIDATES
        } else {
            &SEASONAL_CANDIDATES[..1]
        };

        let mut best: Option<(SarimaOrders, f64)> = None;
        for &(p, q) in &REGULAR_CANDIDATES {
            for &(bp, bq) in seasonal_pairs {
                let candidate = SarimaOrders {
                    p,
                    q,
                    bp,
                    bq,
                    ..current
                };
                let mut trial = model.clone();
                trial.set_orders(candidate);
                let Ok(estimation) = estimate(&trial, self.precision) else {
                    continue;
                };
                let bic = estimation.bic();
                if bic.is_finite() && best.as_ref().map_or(true, |(_, b)| bic < *b) {
                    best = Some((candidate, bic));
                }
            }
        }

        let Some((mut chosen, _)) = best else {
            return ProcessingResult::Failed;
        };
        if force_moving_average && chosen.free_parameters() == 0 {
            chosen.q = 1;
        }
        if chosen == current {
            ProcessingResult::Unchanged
        } else {
            model.set_orders(chosen);
            ProcessingResult::Changed
        }
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
    fn white_noise_selects_no_arma_part() {
        let mut model = ModelDescription::new(noise(240, 5), 12, (2000, 0), false);
        OrderSelector::new(Precision::intermediate()).process(&mut model, false, false);
        assert_eq!(model.orders().free_parameters(), 0);
    }

    #[test]
    fn strong_ar1_is_identified() {
        let e = noise(400, 13);
        let mut values = vec![0.0; 400];
        values[0] = e[0];
        for t in 1..400 {
            values[t] = 0.8 * values[t - 1] + e[t];
        }
        let mut model = ModelDescription::new(values, 12, (2000, 0), false);
        let result =
            OrderSelector::new(Precision::intermediate()).process(&mut model, false, false);
        assert_eq!(result, ProcessingResult::Changed);
        let orders = model.orders();
        assert!(orders.p >= 1 || orders.q >= 1);
        assert!(orders.free_parameters() <= 2);
    }

    #[test]
    fn forced_moving_average_avoids_pure_noise() {
        let mut model = ModelDescription::new(noise(240, 7), 12, (2000, 0), false);
        OrderSelector::new(Precision::intermediate()).process(&mut model, false, true);
        assert_eq!(model.orders().q, 1);
    }

    #[test]
    fn differencing_orders_are_preserved() {
        let e = noise(240, 23);
        let mut values = vec![0.0; 240];
        values[0] = e[0];
        for t in 1..240 {
            values[t] = values[t - 1] + e[t];
        }
        let mut model = ModelDescription::new(values, 12, (2000, 0), false);
        let mut orders = model.orders();
        orders.d = 1;
        model.set_orders(orders);

        OrderSelector::new(Precision::intermediate()).process(&mut model, false, false);
        assert_eq!(model.orders().d, 1);
    }
}
