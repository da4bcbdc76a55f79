//! Time series container and differencing operations.

use crate::error::{RegArimaError, Result};

/// Annual frequencies supported by the identification engine.
const SUPPORTED_FREQUENCIES: [usize; 6] = [1, 2, 3, 4, 6, 12];

/// A regular periodic time series anchored at a calendar position.
///
/// Values are stored at a fixed annual frequency (12 = monthly, 4 =
/// quarterly, ...). The start position `(year, period)` anchors the series
/// on the calendar so that deterministic regressors (trading days, Easter)
/// can be generated for its domain; `period` is zero-based.
#[derive(Debug, Clone, PartialEq)]
pub struct TsData {
    values: Vec<f64>,
    frequency: usize,
    start_year: i32,
    start_period: usize,
}

impl TsData {
    /// Create a new series.
    ///
    /// Fails on empty data, missing values, an unsupported frequency or a
    /// start period outside `0..frequency`.
    pub fn new(
        values: Vec<f64>,
        frequency: usize,
        start_year: i32,
        start_period: usize,
    ) -> Result<Self> {
        if values.is_empty() {
            return Err(RegArimaError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RegArimaError::MissingValues);
        }
        if !SUPPORTED_FREQUENCIES.contains(&frequency) {
            return Err(RegArimaError::UnsupportedFrequency(frequency));
        }
        if start_period >= frequency {
            return Err(RegArimaError::InvalidParameter(format!(
                "start period {} out of range for frequency {}",
                start_period, frequency
            )));
        }
        Ok(Self {
            values,
            frequency,
            start_year,
            start_period,
        })
    }

    /// Monthly series starting at January of the given year.
    pub fn monthly(values: Vec<f64>, start_year: i32) -> Result<Self> {
        Self::new(values, 12, start_year, 0)
    }

    /// Quarterly series starting at the first quarter of the given year.
    pub fn quarterly(values: Vec<f64>, start_year: i32) -> Result<Self> {
        Self::new(values, 4, start_year, 0)
    }

    /// Observations.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty (never true for a constructed series).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Annual frequency.
    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// Calendar anchor of the first observation.
    pub fn start(&self) -> (i32, usize) {
        (self.start_year, self.start_period)
    }

    /// Calendar position `(year, period)` of observation `index`.
    pub fn position(&self, index: usize) -> (i32, usize) {
        let absolute = self.start_period + index;
        (
            self.start_year + (absolute / self.frequency) as i32,
            absolute % self.frequency,
        )
    }
}

/// Span of observation indices used for fitting, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimationSpan {
    /// First index included.
    pub start: usize,
    /// One past the last index included.
    pub end: usize,
}

impl EstimationSpan {
    /// Span covering all `n` observations.
    pub fn all(n: usize) -> Self {
        Self { start: 0, end: n }
    }

    /// Number of observations in the span.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Apply regular differencing of the given order.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing of the given order at the given period.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 || series.len() <= period {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            break;
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}
