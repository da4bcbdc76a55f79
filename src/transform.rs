//! Level versus log transformation decision.

use crate::error::{RegArimaError, Result};
use crate::series::difference;

/// Transformation policy for the input series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformPolicy {
    /// Keep the series in levels.
    None,
    /// Take logs (requires strictly positive data).
    Log,
    /// Choose automatically, favoring logs by the weight `fct`.
    ///
    /// The log candidate wins when its geometric-mean-corrected residual
    /// sum of squares is below `fct` times the level candidate's. Values
    /// below 1 favor logs.
    Auto {
        /// Log-preference weight (default 0.95).
        fct: f64,
    },
}

impl Default for TransformPolicy {
    fn default() -> Self {
        TransformPolicy::Auto { fct: 0.95 }
    }
}

/// Outcome of the transformation decision.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Transformed series.
    pub values: Vec<f64>,
    /// Whether logs were applied.
    pub log: bool,
}

/// Apply the transformation policy to a raw series.
///
/// Under `Auto`, a non-positive value abandons the log candidate for this
/// series only: the decision silently falls back to levels. An explicit
/// `Log` request on non-positive data is a caller error.
pub fn choose_transform(values: &[f64], policy: TransformPolicy) -> Result<TransformResult> {
    if values.is_empty() {
        return Err(RegArimaError::EmptyData);
    }
    match policy {
        TransformPolicy::None => Ok(TransformResult {
            values: values.to_vec(),
            log: false,
        }),
        TransformPolicy::Log => {
            if values.iter().any(|&v| v <= 0.0) {
                return Err(RegArimaError::NonPositiveData);
            }
            Ok(TransformResult {
                values: values.iter().map(|v| v.ln()).collect(),
                log: true,
            })
        }
        TransformPolicy::Auto { fct } => {
            if values.iter().any(|&v| v <= 0.0) || values.len() < 3 {
                return Ok(TransformResult {
                    values: values.to_vec(),
                    log: false,
                });
            }
            let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
            if log_preferred(values, &logs, fct) {
                Ok(TransformResult { values: logs, log: true })
            } else {
                Ok(TransformResult {
                    values: values.to_vec(),
                    log: false,
                })
            }
        }
    }
}

/// Compare detrended sums of squares in levels and in logs.
///
/// The log sum of squares is rescaled by the squared geometric mean so both
/// candidates are measured on the same scale; logs win when the corrected
/// figure drops below `fct` times the level figure.
fn log_preferred(levels: &[f64], logs: &[f64], fct: f64) -> bool {
    let ssq_level = centered_ssq(&difference(levels, 1));
    let ssq_log = centered_ssq(&difference(logs, 1));
    let gmean = (logs.iter().sum::<f64>() / logs.len() as f64).exp();
    let corrected = ssq_log * gmean * gmean;
    corrected.is_finite() && corrected < fct * ssq_level
}

fn centered_ssq(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum()
}
