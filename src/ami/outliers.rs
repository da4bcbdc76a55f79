//! Automatic outlier detection.
//!
//! Single-pass forward search: at the current model's residuals, every
//! candidate outlier column is pushed through the same differencing and
//! ARMA filter as the data, and its score statistic is compared against the
//! critical value. The strongest exceedance is added to the regression and
//! the model re-estimated, until nothing exceeds the threshold or the cap
//! is reached.

use crate::ami::ProcessingResult;
use crate::calendar::outlier_column;
use crate::estimation::estimator::{estimate, expand_polynomials, filter, Precision};
use crate::model::variables::{OutlierKind, Variable};
use crate::model::ModelDescription;
use crate::series::{difference, seasonal_difference, EstimationSpan};

/// Hard cap on detected outliers per identification cycle.
pub const MAX_OUTLIERS: usize = 24;

/// One candidate exceedance found by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierHit {
    pub kind: OutlierKind,
    pub position: usize,
    pub tstat: f64,
}

/// Forward outlier search over the estimation span.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    kinds: Vec<OutlierKind>,
    max_outliers: usize,
    search_span: Option<EstimationSpan>,
    precision: Precision,
}

impl OutlierDetector {
    pub fn new(kinds: Vec<OutlierKind>, precision: Precision) -> Self {
        Self {
            kinds,
            max_outliers: MAX_OUTLIERS,
            search_span: None,
            precision,
        }
    }

    pub fn with_max_outliers(mut self, max_outliers: usize) -> Self {
        self.max_outliers = max_outliers;
        self
    }

    /// Restrict where outliers may be placed. Scoring still uses the full
    /// estimation span.
    pub fn with_search_span(mut self, search_span: Option<EstimationSpan>) -> Self {
        self.search_span = search_span;
        self
    }

    /// Score every admissible candidate and return the strongest one.
    ///
    /// The model must carry a current estimation.
    pub fn strongest(&self, model: &ModelDescription, critical_value: f64) -> Option<OutlierHit> {
        let estimation = model.estimation()?;
        let residuals = &estimation.residuals;
        if residuals.len() < 4 {
            return None;
        }
        let sigma = robust_sigma(residuals);
        if sigma <= 0.0 {
            return None;
        }

        let span = model.span();
        let orders = model.orders();
        let frequency = model.frequency();
        let n = model.series().len();
        let (ar, ma) = expand_polynomials(orders, &estimation.parameters, frequency);

        let search_start = self
            .search_span
            .map_or(span.start, |s| s.start.max(span.start));
        let search_end = self.search_span.map_or(span.end, |s| s.end.min(span.end));

        let mut best: Option<OutlierHit> = None;
        for position in search_start..search_end {
            for &kind in &self.kinds {
                if !admissible(kind, position, span.start, span.end, frequency) {
                    continue;
                }
                if model.variable(&format!("{}.{}", kind.code(), position)).is_some() {
                    continue;
                }
                let column = outlier_column(kind, position, n, frequency);
                let windowed = &column[span.start..span.end];
                let differenced =
                    seasonal_difference(&difference(windowed, orders.d), orders.bd, frequency);
                let filtered = filter(&differenced, &ar, &ma);

                let cross: f64 = filtered.iter().zip(residuals).map(|(c, e)| c * e).sum();
                let norm: f64 = filtered.iter().map(|c| c * c).sum();
                if norm <= 0.0 {
                    continue;
                }
                let tstat = cross / (sigma * norm.sqrt());
                if tstat.abs() > critical_value
                    && best.map_or(true, |b| tstat.abs() > b.tstat.abs())
                {
                    best = Some(OutlierHit {
                        kind,
                        position,
                        tstat,
                    });
                }
            }
        }
        best
    }

    /// Run the forward search to exhaustion and add the hits to the model.
    pub fn process(&self, model: &mut ModelDescription, critical_value: f64) -> ProcessingResult {
        if self.kinds.is_empty() {
            return ProcessingResult::Unprocessed;
        }
        let mut changed = false;
        while model.estimated_outlier_count() < self.max_outliers {
            if model.is_stale() {
                match estimate(model, self.precision) {
                    Ok(estimation) => model.set_estimation(estimation),
                    Err(_) => {
                        return if changed {
                            ProcessingResult::Changed
                        } else {
                            ProcessingResult::Failed
                        }
                    }
                }
            }
            match self.strongest(model, critical_value) {
                Some(hit) => {
                    model.add_variable(Variable::outlier(hit.kind, hit.position));
                    changed = true;
                }
                None => break,
            }
        }
        if changed {
            ProcessingResult::Changed
        } else {
            ProcessingResult::Unchanged
        }
    }
}

/// A level shift at either end of the span is indistinguishable from the
/// level itself; seasonal outliers need a full cycle on each side.
fn admissible(kind: OutlierKind, position: usize, start: usize, end: usize, frequency: usize) -> bool {
    match kind {
        OutlierKind::LevelShift => position > start && position + 1 < end,
        OutlierKind::Seasonal => position >= start + frequency && position + frequency < end,
        _ => true,
    }
}

/// Scale estimate that a handful of large residuals cannot inflate.
fn robust_sigma(residuals: &[f64]) -> f64 {
    let mut absolute: Vec<f64> = residuals.iter().map(|e| e.abs()).collect();
    absolute.sort_by(|a, b| a.total_cmp(b));
    let median = absolute[absolute.len() / 2];
    1.483 * median
}
