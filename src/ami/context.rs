//! Shared state of one identification run.

use crate::stats::seasonality::SeasonalityTest;

/// Mutable state threaded through the identification loop.
///
/// The engine owns the context; the processing components read it to decide
/// how aggressive to be, and the engine relaxes its thresholds between
/// rounds when no candidate is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Outer round counter, starting at zero with the airline candidate.
    pub round: usize,
    /// Inner pass counter within the current round.
    pub pass: usize,
    /// Current outlier critical value.
    pub critical_value: f64,
    /// Critical value the run started with, kept for reporting.
    pub initial_critical_value: f64,
    /// Current Ljung-Box acceptance limit.
    pub ljung_box_limit: f64,
    /// Seasonality pre-test outcome, fixed for the whole run.
    pub seasonality: SeasonalityTest,
    /// Whether automatic structure selection is still active. Cleared when
    /// the loop falls back to the canonical specification.
    pub automatic: bool,
}

impl RunContext {
    pub fn new(critical_value: f64, ljung_box_limit: f64, seasonality: SeasonalityTest) -> Self {
        Self {
            round: 0,
            pass: 0,
            critical_value,
            initial_critical_value: critical_value,
            ljung_box_limit,
            seasonality,
            automatic: true,
        }
    }

    /// Whether the series carries identifiable seasonality.
    pub fn seasonal(&self) -> bool {
        self.seasonality.seasonal
    }

    /// Reduce the outlier critical value geometrically, never below `floor`.
    pub fn relax_critical_value(&mut self, reduction: f64, floor: f64) {
        self.critical_value = (self.critical_value * (1.0 - reduction)).max(floor);
    }

    /// Raise the Ljung-Box acceptance limit, capped just below one.
    pub fn raise_ljung_box_limit(&mut self, delta: f64) {
        self.ljung_box_limit = (self.ljung_box_limit + delta).min(0.999);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seasonal_outcome(seasonal: bool) -> SeasonalityTest {
        SeasonalityTest {
            seasonal,
            strength: if seasonal { 1 } else { 0 },
        }
    }

    #[test]
    fn relaxation_respects_floor() {
        let mut context = RunContext::new(3.0, 0.95, seasonal_outcome(true));
        context.relax_critical_value(0.14286, 2.8);
        assert_relative_eq!(context.critical_value, 2.8);
        assert_relative_eq!(context.initial_critical_value, 3.0);
        assert!(context.seasonal());

        let mut context = RunContext::new(4.0, 0.95, seasonal_outcome(true));
        context.relax_critical_value(0.14286, 2.8);
        assert_relative_eq!(context.critical_value, 4.0 * (1.0 - 0.14286));
    }

    #[test]
    fn ljung_box_limit_is_capped() {
        let mut context = RunContext::new(3.5, 0.99, seasonal_outcome(false));
        context.raise_ljung_box_limit(0.025);
        assert_relative_eq!(context.ljung_box_limit, 0.999);
    }
}
