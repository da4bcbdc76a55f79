//! The working model description.
//!
//! A single mutable entity owned by the identification loop for the
//! duration of one series' processing. Every sub-component reads it and
//! conditionally mutates it; any structural mutation clears the attached
//! estimation so that staleness is an explicit state, never an inference
//! from control flow.

use crate::calendar;
use crate::estimation::Estimation;
use crate::model::orders::SarimaOrders;
use crate::model::variables::{Variable, VariableRole};
use crate::series::EstimationSpan;

/// Working model description.
///
/// `clone()` is a true deep copy (all containers are owned), so reference
/// snapshots taken by the loop are isolated from later mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescription {
    series: Vec<f64>,
    frequency: usize,
    start: (i32, usize),
    span: EstimationSpan,
    log: bool,
    mean: bool,
    orders: SarimaOrders,
    variables: Vec<Variable>,
    estimation: Option<Estimation>,
}

impl ModelDescription {
    /// Create a description over a transformed series.
    pub fn new(series: Vec<f64>, frequency: usize, start: (i32, usize), log: bool) -> Self {
        let span = EstimationSpan::all(series.len());
        Self {
            series,
            frequency,
            start,
            span,
            log,
            mean: false,
            orders: SarimaOrders::none(),
            variables: Vec::new(),
            estimation: None,
        }
    }

    /// Transformed series over the full domain.
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    /// Annual frequency.
    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// Calendar anchor of the first observation.
    pub fn start(&self) -> (i32, usize) {
        self.start
    }

    /// Span used for fitting.
    pub fn span(&self) -> EstimationSpan {
        self.span
    }

    /// Restrict the span used for fitting.
    pub fn set_span(&mut self, span: EstimationSpan) {
        if span != self.span {
            self.span = span;
            self.invalidate();
        }
    }

    /// Whether the series is in logs.
    pub fn log(&self) -> bool {
        self.log
    }

    /// Intercept flag.
    pub fn mean(&self) -> bool {
        self.mean
    }

    /// Set the intercept flag.
    pub fn set_mean(&mut self, mean: bool) {
        if mean != self.mean {
            self.mean = mean;
            self.invalidate();
        }
    }

    /// Current ARIMA orders.
    pub fn orders(&self) -> SarimaOrders {
        self.orders
    }

    /// Replace the ARIMA orders.
    pub fn set_orders(&mut self, orders: SarimaOrders) {
        if orders != self.orders {
            self.orders = orders;
            self.invalidate();
        }
    }

    /// Ordered regression variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Add a variable; a variable with the same name is replaced.
    pub fn add_variable(&mut self, variable: Variable) {
        self.variables.retain(|v| v.name != variable.name);
        self.variables.push(variable);
        self.invalidate();
    }

    /// Remove a variable by name. Prespecified variables are never removed.
    pub fn remove_variable(&mut self, name: &str) -> bool {
        let before = self.variables.len();
        self.variables
            .retain(|v| v.prespecified || v.name != name);
        let removed = self.variables.len() != before;
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Drop every non-prespecified outlier.
    pub fn clear_estimated_outliers(&mut self) {
        let before = self.variables.len();
        self.variables.retain(|v| v.prespecified || !v.is_outlier());
        if self.variables.len() != before {
            self.invalidate();
        }
    }

    /// Number of outliers found by detection (prespecified ones excluded).
    pub fn estimated_outlier_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.is_outlier() && !v.prespecified)
            .count()
    }

    /// Whether a trading-day or working-day variable is present.
    pub fn has_calendar_days(&self) -> bool {
        self.variables.iter().any(|v| {
            matches!(
                v.role,
                VariableRole::TradingDays | VariableRole::WorkingDays
            )
        })
    }

    /// Whether an Easter variable is present.
    pub fn has_easter(&self) -> bool {
        self.variables
            .iter()
            .any(|v| matches!(v.role, VariableRole::Easter))
    }

    /// Whether a leap-year variable is present.
    pub fn has_leap_year(&self) -> bool {
        self.variables
            .iter()
            .any(|v| matches!(v.role, VariableRole::LeapYear))
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Regressor columns of a variable over the full series domain.
    pub fn variable_columns(&self, variable: &Variable) -> Vec<Vec<f64>> {
        let n = self.series.len();
        match &variable.role {
            VariableRole::TradingDays => {
                calendar::trading_day_columns(n, self.frequency, self.start)
            }
            VariableRole::WorkingDays => {
                vec![calendar::working_day_column(n, self.frequency, self.start)]
            }
            VariableRole::LeapYear => {
                vec![calendar::leap_year_column(n, self.frequency, self.start)]
            }
            VariableRole::Easter => vec![calendar::easter_column(
                n,
                self.frequency,
                self.start,
                calendar::EASTER_DURATION,
            )],
            VariableRole::Outlier { kind, position } => {
                vec![calendar::outlier_column(*kind, *position, n, self.frequency)]
            }
            VariableRole::User { columns } => columns.clone(),
        }
    }

    /// Series with fixed-coefficient variable effects removed.
    ///
    /// Fixed-coefficient variables are pre-adjustments: they never enter
    /// the design matrix, so their effect is subtracted here.
    pub fn adjusted_series(&self) -> Vec<f64> {
        let mut adjusted = self.series.clone();
        for variable in &self.variables {
            let Some(coefficients) = &variable.fixed_coefficients else {
                continue;
            };
            let columns = self.variable_columns(variable);
            for (column, coef) in columns.iter().zip(coefficients) {
                for (a, x) in adjusted.iter_mut().zip(column) {
                    *a -= coef * x;
                }
            }
        }
        adjusted
    }

    /// Design columns of every estimated variable, in variable order.
    ///
    /// Each entry is `(variable name, column)`; multi-column variables
    /// contribute one entry per column.
    pub fn regression_columns(&self) -> Vec<(String, Vec<f64>)> {
        let mut out = Vec::new();
        for variable in &self.variables {
            if !variable.is_estimated() {
                continue;
            }
            for (k, column) in self.variable_columns(variable).into_iter().enumerate() {
                let name = if variable.dimension() > 1 {
                    format!("{}.{}", variable.name, k)
                } else {
                    variable.name.clone()
                };
                out.push((name, column));
            }
        }
        out
    }

    /// Attached estimation, if current.
    pub fn estimation(&self) -> Option<&Estimation> {
        self.estimation.as_ref()
    }

    /// Attach a fresh estimation result.
    pub fn set_estimation(&mut self, estimation: Estimation) {
        self.estimation = Some(estimation);
    }

    /// Clear the estimation; the model is stale until re-estimated.
    pub fn invalidate(&mut self) {
        self.estimation = None;
    }

    /// Whether the model needs re-estimation.
    pub fn is_stale(&self) -> bool {
        self.estimation.is_none()
    }
}
