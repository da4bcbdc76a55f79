//! Automatic selection of the differencing orders and the mean.

use crate::ami::ProcessingResult;
use crate::model::orders::MAX_D;
use crate::model::ModelDescription;
use crate::series::{difference, seasonal_difference};
use crate::stats::acf::{autocorrelations, autocovariances};

/// Differencing orders and mean decision for one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferencingDecision {
    pub d: usize,
    pub bd: usize,
    pub mean: bool,
}

/// Selects regular and seasonal differencing from the correlogram.
///
/// The regular order grows from zero until the low-lag correlogram looks
/// stationary; starting at zero keeps already-stationary series from being
/// over-differenced. The seasonal order is taken from the variance reduction
/// achieved by one seasonal difference.
#[derive(Debug, Clone)]
pub struct DifferencingSelector {
    t_mean: f64,
    variance_ratio_limit: f64,
}

impl Default for DifferencingSelector {
    fn default() -> Self {
        Self {
            t_mean: 1.96,
            variance_ratio_limit: 0.7,
        }
    }
}

impl DifferencingSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_t_mean(mut self, t_mean: f64) -> Self {
        self.t_mean = t_mean;
        self
    }

    /// Decide the orders for a series at the given frequency.
    pub fn select(&self, values: &[f64], frequency: usize, seasonal: bool) -> DifferencingDecision {
        let bd = if seasonal && frequency > 1 && self.seasonal_difference_helps(values, frequency) {
            1
        } else {
            0
        };
        let deseasonalized = seasonal_difference(values, bd, frequency);

        let mut d = 0;
        let mut stationary = is_stationary(&deseasonalized, frequency);
        while !stationary && d < MAX_D {
            d += 1;
            stationary = is_stationary(&difference(&deseasonalized, d), frequency);
        }

        let differenced = difference(&deseasonalized, d);
        // a drift on a series that never settled is an artifact, not a mean
        let mean = stationary && mean_is_significant(&differenced, self.t_mean);

        DifferencingDecision { d, bd, mean }
    }

    /// Apply the decision to the working model.
    pub fn process(&self, model: &mut ModelDescription, seasonal: bool) -> ProcessingResult {
        let span = model.span();
        let adjusted = model.adjusted_series();
        if span.len() < 8 || span.end > adjusted.len() {
            return ProcessingResult::Unprocessed;
        }
        let decision = self.select(&adjusted[span.start..span.end], model.frequency(), seasonal);

        let mut orders = model.orders();
        let changed = orders.d != decision.d || orders.bd != decision.bd
            || model.mean() != decision.mean;
        orders.d = decision.d;
        orders.bd = decision.bd;
        model.set_orders(orders);
        model.set_mean(decision.mean);
        if changed {
            ProcessingResult::Changed
        } else {
            ProcessingResult::Unchanged
        }
    }

    fn seasonal_difference_helps(&self, values: &[f64], frequency: usize) -> bool {
        if values.len() < 2 * frequency + 2 {
            return false;
        }
        let seasonal = seasonal_difference(values, 1, frequency);
        let base = variance(values);
        if base <= 0.0 {
            return false;
        }
        variance(&seasonal) / base < self.variance_ratio_limit
    }
}

/// Low-lag stationarity screen on the correlogram.
///
/// Quarterly and coarser series are stationary when some correlation within
/// one seasonal cycle has dropped to 0.2; finer series when an early
/// autocovariance or the seasonal-lag autocovariance has turned nonpositive.
fn is_stationary(values: &[f64], frequency: usize) -> bool {
    if values.len() < frequency + 2 || values.len() < 6 {
        return true;
    }
    if frequency <= 4 {
        let acf = autocorrelations(values, frequency);
        acf.iter().skip(1).any(|&r| r <= 0.2)
    } else {
        let cov = autocovariances(values, frequency);
        cov.iter().skip(1).take(4).any(|&c| c <= 0.0) || cov[frequency] <= 0.0
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn mean_is_significant(values: &[f64], t_limit: f64) -> bool {
    let n = values.len();
    if n < 3 {
        return false;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    if var <= 0.0 {
        return false;
    }
    (mean / (var / n as f64).sqrt()).abs() > t_limit
}
