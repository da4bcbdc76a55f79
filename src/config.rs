//! Run configuration of the identification engine.

use crate::estimation::Precision;
use crate::model::orders::SarimaOrders;
use crate::model::variables::{OutlierKind, Variable};
use crate::series::EstimationSpan;
use crate::transform::TransformPolicy;

/// How the differencing orders are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferencingPolicy {
    /// Selected from the correlogram.
    Auto,
    /// Imposed by the caller.
    Fixed { d: usize, bd: usize },
}

/// How the ARMA orders are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmaPolicy {
    /// Identified by information criterion.
    Auto,
    /// Imposed by the caller; structure selection is skipped entirely.
    Fixed(SarimaOrders),
}

/// Calendar-effect candidate offered to the regression tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingDaysOption {
    None,
    /// Six weekday contrasts.
    TradingDays,
    /// One weekday-versus-weekend contrast.
    WorkingDays,
    /// Let the joint tests choose between the two, or neither.
    Auto,
}

/// Significance test applied to the regression part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressionTestMethod {
    /// Per-variable t threshold.
    DefaultThreshold,
    /// Joint F tests with automatic calendar choice.
    AutomaticF,
    /// Joint Wald tests with automatic calendar choice.
    AutomaticWald,
}

/// Outlier-detection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierPolicy {
    pub enabled: bool,
    pub kinds: Vec<OutlierKind>,
    /// Detection threshold; zero means derive it from the series length.
    pub critical_value: f64,
    pub max_per_cycle: usize,
    /// Restrict where outliers may be placed; `None` searches everywhere.
    pub span: Option<EstimationSpan>,
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            kinds: vec![
                OutlierKind::Additive,
                OutlierKind::LevelShift,
                OutlierKind::TransitoryChange,
            ],
            critical_value: 0.0,
            max_per_cycle: 24,
            span: None,
        }
    }
}

impl OutlierPolicy {
    /// Effective critical value for a series of `n` observations.
    pub fn critical_value_for(&self, n: usize) -> f64 {
        if self.critical_value > 0.0 {
            return self.critical_value;
        }
        if n < 50 {
            3.3
        } else if n < 150 {
            3.5
        } else if n < 350 {
            3.8
        } else {
            4.0
        }
    }
}

/// Regression-test thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionPolicy {
    pub td_p_value: f64,
    pub t_mean: f64,
    pub t_easter: f64,
    /// Whether a mean is offered to the differencing test at all.
    pub mean: bool,
    /// Whether an Easter candidate is offered.
    pub easter: bool,
    /// Whether a leap-year candidate rides with the calendar effect.
    pub leap_year: bool,
}

impl Default for RegressionPolicy {
    fn default() -> Self {
        Self {
            td_p_value: 0.01,
            t_mean: 1.96,
            t_easter: 2.2,
            mean: true,
            easter: true,
            leap_year: true,
        }
    }
}

/// Optimizer settings for the final fit and the coarser in-loop fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimationPolicy {
    /// Convergence tolerance of the final fit.
    pub tolerance: f64,
    pub max_iter: usize,
    /// Convergence tolerance of the fits run inside the loop.
    pub intermediate_tolerance: f64,
    pub intermediate_max_iter: usize,
    /// t threshold under which a top-lag ARMA parameter may be pruned.
    pub tsig: f64,
}

impl Default for EstimationPolicy {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            max_iter: 1000,
            intermediate_tolerance: 1e-5,
            intermediate_max_iter: 300,
            tsig: 1.0,
        }
    }
}

impl EstimationPolicy {
    pub fn exact_precision(&self) -> Precision {
        Precision {
            tolerance: self.tolerance,
            max_iter: self.max_iter,
        }
    }

    pub fn intermediate_precision(&self) -> Precision {
        Precision {
            tolerance: self.intermediate_tolerance,
            max_iter: self.intermediate_max_iter,
        }
    }
}

/// Full specification of one identification run.
#[derive(Debug, Clone, PartialEq)]
pub struct RegArimaSpec {
    pub transform: TransformPolicy,
    pub differencing: DifferencingPolicy,
    pub arma: ArmaPolicy,
    pub trading_days: TradingDaysOption,
    pub regression_test: RegressionTestMethod,
    pub outliers: OutlierPolicy,
    pub regression: RegressionPolicy,
    pub estimation: EstimationPolicy,
    /// Caller-fixed regression variables; never tested or removed.
    pub prespecified: Vec<Variable>,
    /// Accept the round-zero airline fit outright when its residuals pass.
    pub accept_airline: bool,
    /// Starting Ljung-Box acceptance limit.
    pub ljung_box_limit: f64,
    /// Geometric reduction of the outlier critical value between rounds.
    pub reduce_cv: f64,
    /// Floor of the relaxed critical value.
    pub min_cv: f64,
    /// AR/MA root-pair distance under which a common factor is cancelled.
    pub cancel: f64,
    /// AR root modulus treated as a unit root by the final estimator.
    pub unit_root_limit: f64,
}

impl Default for RegArimaSpec {
    fn default() -> Self {
        Self {
            transform: TransformPolicy::default(),
            differencing: DifferencingPolicy::Auto,
            arma: ArmaPolicy::Auto,
            trading_days: TradingDaysOption::Auto,
            regression_test: RegressionTestMethod::AutomaticF,
            outliers: OutlierPolicy::default(),
            regression: RegressionPolicy::default(),
            estimation: EstimationPolicy::default(),
            prespecified: Vec::new(),
            accept_airline: false,
            ljung_box_limit: 0.95,
            reduce_cv: 0.14286,
            min_cv: 2.8,
            cancel: 0.044,
            unit_root_limit: 0.96,
        }
    }
}

impl RegArimaSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transform(mut self, transform: TransformPolicy) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_differencing(mut self, differencing: DifferencingPolicy) -> Self {
        self.differencing = differencing;
        self
    }

    pub fn with_arma(mut self, arma: ArmaPolicy) -> Self {
        self.arma = arma;
        self
    }

    pub fn with_trading_days(mut self, trading_days: TradingDaysOption) -> Self {
        self.trading_days = trading_days;
        self
    }

    pub fn with_regression_test(mut self, method: RegressionTestMethod) -> Self {
        self.regression_test = method;
        self
    }

    pub fn with_outliers(mut self, outliers: OutlierPolicy) -> Self {
        self.outliers = outliers;
        self
    }

    pub fn without_outliers(mut self) -> Self {
        self.outliers.enabled = false;
        self
    }

    /// Fix regression variables ahead of the run; they are marked
    /// prespecified and survive every test and prune.
    pub fn with_prespecified(mut self, variables: Vec<Variable>) -> Self {
        self.prespecified = variables;
        self
    }

    pub fn with_accept_airline(mut self, accept: bool) -> Self {
        self.accept_airline = accept;
        self
    }

    pub fn with_ljung_box_limit(mut self, limit: f64) -> Self {
        self.ljung_box_limit = limit;
        self
    }
}
