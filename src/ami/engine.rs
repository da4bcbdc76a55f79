//! The identification loop.
//!
//! Round zero fits the airline benchmark. Each later round re-selects the
//! differencing, the ARMA orders and the regression, re-detects outliers,
//! and lets the controllers challenge the result; the round's candidate is
//! accepted when its residuals pass the portmanteau screen at the current
//! limit. Rejected rounds relax the outlier critical value and the
//! acceptance limit before trying again, degrade to a canonical
//! specification on the third failure, and prune on the fourth; a pruned
//! model that still fails the screen is dropped and the run falls back to
//! the airline benchmark.

use crate::ami::comparator::{Assessment, ModelComparator};
use crate::ami::context::RunContext;
use crate::ami::controllers::{
    BenchmarkController, ModelController, RegularUnderDifferencingController,
    SeasonalUnderDifferencingController, TradingDaysActivationController,
};
use crate::ami::differencing::DifferencingSelector;
use crate::ami::order::OrderSelector;
use crate::ami::outliers::OutlierDetector;
use crate::ami::regression::{
    AutomaticCalendarTester, DefaultThresholdTester, FastPruneTester, JointTestKind,
    RegressionTester,
};
use crate::ami::ProcessingResult;
use crate::config::{
    ArmaPolicy, DifferencingPolicy, RegArimaSpec, RegressionTestMethod, TradingDaysOption,
};
use crate::error::{RegArimaError, Result};
use crate::estimation::estimator::estimate;
use crate::estimation::finalizer::FinalEstimator;
use crate::model::orders::SarimaOrders;
use crate::model::variables::Variable;
use crate::model::ModelDescription;
use crate::series::TsData;
use crate::stats::seasonality::test_seasonality;
use crate::stats::tests::{ljung_box, LjungBoxResult};
use crate::transform::choose_transform;

const MAX_ITERATIONS: usize = 10;
/// Failed rounds before the loop degrades to the canonical specification.
const FALLBACK_PASS: usize = 3;
/// Failed rounds before the loop prunes and accepts whatever remains.
const TERMINAL_PASS: usize = 4;

/// Terminal state of one identification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmiStatus {
    /// A candidate passed the acceptance screen.
    Converged,
    /// The loop exhausted its budget and returned the airline benchmark.
    FellBackToDefault,
    /// Not even the benchmark could be estimated.
    Failed,
}

/// Outcome of one identification run.
#[derive(Debug, Clone)]
pub struct AmiResult {
    /// The identified model, finally estimated unless `status` is `Failed`.
    pub model: ModelDescription,
    /// How the run ended.
    pub status: AmiStatus,
    /// Rounds consumed by the loop.
    pub iterations: usize,
    /// Outlier critical value in force when the run ended.
    pub critical_value: f64,
    /// Ljung-Box acceptance limit in force when the run ended.
    pub ljung_box_threshold: f64,
    /// Portmanteau test on the final residuals.
    pub ljung_box: Option<LjungBoxResult>,
    /// Full loop state, for diagnostics.
    pub context: RunContext,
}

/// Automatic model identification over a time series.
#[derive(Debug, Clone, Default)]
pub struct AmiEngine {
    spec: RegArimaSpec,
}

impl AmiEngine {
    pub fn new(spec: RegArimaSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &RegArimaSpec {
        &self.spec
    }

    /// Identify and estimate a model for the series.
    pub fn run(&self, data: &TsData) -> Result<AmiResult> {
        let transformed = choose_transform(data.values(), self.spec.transform)?;
        let frequency = data.frequency();
        let seasonality = test_seasonality(&transformed.values, frequency);
        let seasonal = seasonality.seasonal;

        let mut model = ModelDescription::new(
            transformed.values,
            frequency,
            data.start(),
            transformed.log,
        );
        self.seed_regression(&mut model);
        for variable in &self.spec.prespecified {
            for column in model.variable_columns(variable) {
                if column.len() != data.len() {
                    return Err(RegArimaError::DimensionMismatch {
                        expected: data.len(),
                        got: column.len(),
                    });
                }
            }
        }

        let mut context = RunContext::new(
            self.spec.outliers.critical_value_for(data.len()),
            self.spec.ljung_box_limit,
            seasonality,
        );

        // round zero: the airline benchmark
        self.apply_benchmark_structure(&mut model, seasonal);
        self.detect_outliers(&mut model, &context);
        if self.ensure_estimated(&mut model).is_none() {
            return Ok(AmiResult {
                model,
                status: AmiStatus::Failed,
                iterations: 0,
                critical_value: context.critical_value,
                ljung_box_threshold: context.ljung_box_limit,
                ljung_box: None,
                context,
            });
        }
        let benchmark = model.clone();

        if let ArmaPolicy::Fixed(orders) = self.spec.arma {
            model.set_orders(orders);
            context.automatic = false;
            self.detect_outliers(&mut model, &context);
            return Ok(self.finish(model, AmiStatus::Converged, context));
        }

        let comparator = ModelComparator::new(context.ljung_box_limit);
        if self.spec.accept_airline && comparator.is_acceptable(&model) == Some(true) {
            return Ok(self.finish(model, AmiStatus::Converged, context));
        }

        let mut status = None;
        while context.round < MAX_ITERATIONS {
            context.round += 1;
            let comparator = ModelComparator::new(context.ljung_box_limit);

            if context.automatic {
                model.clear_estimated_outliers();
                self.select_differencing(&mut model, seasonal);
                OrderSelector::new(self.spec.estimation.intermediate_precision()).process(
                    &mut model,
                    seasonal,
                    context.pass >= FALLBACK_PASS,
                );
                self.tester().process(&mut model);
            }
            self.detect_outliers(&mut model, &context);
            if context.automatic {
                self.run_controllers(&mut model, &comparator, seasonal);
            }

            if self.ensure_estimated(&mut model).is_none() {
                // an unestimable candidate counts as a failed round
                model = benchmark.clone();
            } else if comparator.is_acceptable(&model) == Some(true) {
                status = Some(AmiStatus::Converged);
                break;
            }

            context.pass += 1;
            let delta = if context.pass == 1 { 0.025 } else { 0.015 };
            context.raise_ljung_box_limit(delta);
            context.relax_critical_value(self.spec.reduce_cv, self.spec.min_cv);

            // after a rejected round, keep whichever of the candidate and
            // the benchmark compares better as the working model
            if context.pass <= FALLBACK_PASS
                && comparator.compare(&model, &benchmark) == Assessment::PreferReference
            {
                model = benchmark.clone();
            }

            if context.pass == FALLBACK_PASS {
                self.apply_canonical_fallback(&mut model, &mut context, seasonal);
            }
            if context.pass >= TERMINAL_PASS {
                FastPruneTester {
                    t_limit: 1.96,
                    precision: self.spec.estimation.intermediate_precision(),
                }
                .process(&mut model);
                let comparator = ModelComparator::new(context.ljung_box_limit);
                if self.ensure_estimated(&mut model).is_some()
                    && comparator.is_acceptable(&model) == Some(true)
                {
                    status = Some(AmiStatus::Converged);
                } else {
                    model = benchmark.clone();
                    status = Some(AmiStatus::FellBackToDefault);
                }
                break;
            }
        }

        let (model, status) = match status {
            Some(status) => (model, status),
            None => (benchmark, AmiStatus::FellBackToDefault),
        };
        Ok(self.finish(model, status, context))
    }

    /// Final precise estimation and cleanup.
    ///
    /// A failure of the fine-precision pass does not discard the run: the
    /// loop's accepted fit is kept and the loop status stands. Only a model
    /// that never estimated at all reports `Failed`.
    fn finish(
        &self,
        mut model: ModelDescription,
        status: AmiStatus,
        context: RunContext,
    ) -> AmiResult {
        let fallback = model.clone();
        model.invalidate();
        let finalizer = FinalEstimator::new(
            self.spec.estimation.exact_precision(),
            context.automatic,
        )
        .with_unit_root_limit(self.spec.unit_root_limit)
        .with_cancel_limit(self.spec.cancel)
        .with_tsig(self.spec.estimation.tsig);
        let status = if finalizer.process(&mut model) == ProcessingResult::Failed {
            if fallback.estimation().is_some() {
                model = fallback;
                status
            } else {
                AmiStatus::Failed
            }
        } else {
            status
        };
        let diagnostics = model.estimation().map(|estimation| {
            ljung_box(
                &estimation.residuals,
                None,
                model.orders().free_parameters(),
            )
        });
        AmiResult {
            model,
            status,
            iterations: context.round,
            critical_value: context.critical_value,
            ljung_box_threshold: context.ljung_box_limit,
            ljung_box: diagnostics,
            context,
        }
    }

    /// Calendar and Easter candidates per the run specification.
    fn seed_regression(&self, model: &mut ModelDescription) {
        for variable in &self.spec.prespecified {
            model.add_variable(variable.clone().prespecified());
        }
        let monthly = model.frequency() == 12;
        let explicit = match self.spec.trading_days {
            TradingDaysOption::TradingDays => Some(Variable::trading_days()),
            TradingDaysOption::WorkingDays => Some(Variable::working_days()),
            // the automatic testers trial the candidates themselves; the
            // threshold tester needs one on the table
            TradingDaysOption::Auto
                if self.spec.regression_test == RegressionTestMethod::DefaultThreshold =>
            {
                Some(Variable::trading_days())
            }
            _ => None,
        };
        if monthly {
            if let Some(variable) = explicit {
                model.add_variable(variable);
                if self.spec.regression.leap_year && !model.log() {
                    model.add_variable(Variable::leap_year());
                }
            }
            if self.spec.regression.easter {
                model.add_variable(Variable::easter());
            }
        }
    }

    fn apply_benchmark_structure(&self, model: &mut ModelDescription, seasonal: bool) {
        let mut orders = SarimaOrders::airline(seasonal && model.frequency() > 1);
        if let DifferencingPolicy::Fixed { d, bd } = self.spec.differencing {
            orders.d = d;
            orders.bd = bd;
        }
        model.set_orders(orders);
        model.set_mean(false);
    }

    fn select_differencing(&self, model: &mut ModelDescription, seasonal: bool) {
        match self.spec.differencing {
            DifferencingPolicy::Auto => {
                DifferencingSelector::new()
                    .with_t_mean(self.spec.regression.t_mean)
                    .process(model, seasonal);
                if !self.spec.regression.mean {
                    model.set_mean(false);
                }
            }
            DifferencingPolicy::Fixed { d, bd } => {
                let mut orders = model.orders();
                orders.d = d;
                orders.bd = bd;
                model.set_orders(orders);
            }
        }
    }

    fn detect_outliers(&self, model: &mut ModelDescription, context: &RunContext) {
        if !self.spec.outliers.enabled {
            return;
        }
        OutlierDetector::new(
            self.spec.outliers.kinds.clone(),
            self.spec.estimation.intermediate_precision(),
        )
        .with_max_outliers(self.spec.outliers.max_per_cycle)
        .with_search_span(self.spec.outliers.span)
        .process(model, context.critical_value);
    }

    fn tester(&self) -> Box<dyn RegressionTester> {
        let regression = self.spec.regression;
        let precision = self.spec.estimation.intermediate_precision();
        match self.spec.regression_test {
            RegressionTestMethod::DefaultThreshold => Box::new(DefaultThresholdTester {
                t_limit: 1.96,
                t_mean: regression.t_mean,
                precision,
            }),
            RegressionTestMethod::AutomaticF => Box::new(AutomaticCalendarTester {
                kind: JointTestKind::F,
                td_p_value: regression.td_p_value,
                t_easter: regression.t_easter,
                t_mean: regression.t_mean,
                leap_year: regression.leap_year,
                precision,
            }),
            RegressionTestMethod::AutomaticWald => Box::new(AutomaticCalendarTester {
                kind: JointTestKind::Wald,
                td_p_value: regression.td_p_value,
                t_easter: regression.t_easter,
                t_mean: regression.t_mean,
                leap_year: regression.leap_year,
                precision,
            }),
        }
    }

    fn run_controllers(
        &self,
        model: &mut ModelDescription,
        comparator: &ModelComparator,
        seasonal: bool,
    ) {
        let precision = self.spec.estimation.intermediate_precision();
        let controllers: Vec<Box<dyn ModelController>> = vec![
            Box::new(RegularUnderDifferencingController {
                root_limit: 0.90,
                precision,
            }),
            Box::new(SeasonalUnderDifferencingController {
                root_limit: 0.80,
                precision,
            }),
            Box::new(BenchmarkController {
                seasonal,
                precision,
            }),
        ];
        for controller in controllers {
            controller.process(model, comparator);
        }
        if self.spec.trading_days == TradingDaysOption::Auto {
            TradingDaysActivationController {
                t_limit: 1.96,
                precision,
            }
            .process(model, comparator);
        }
    }

    /// Degraded specification used when identification keeps failing:
    /// a rich regular AR, one MA term per part, and no outliers, with
    /// structure selection switched off for the rest of the run.
    fn apply_canonical_fallback(
        &self,
        model: &mut ModelDescription,
        context: &mut RunContext,
        seasonal: bool,
    ) {
        let mut orders = model.orders();
        orders.p = 3;
        orders.q = 1;
        orders.bp = 0;
        orders.bq = usize::from(seasonal && model.frequency() > 1);
        model.set_orders(orders);
        model.clear_estimated_outliers();
        context.automatic = false;
    }

    fn ensure_estimated(&self, model: &mut ModelDescription) -> Option<()> {
        if model.is_stale() {
            let estimation = estimate(model, self.spec.estimation.intermediate_precision()).ok()?;
            model.set_estimation(estimation);
        }
        Some(())
    }
}
