//! Numeric estimation of regression-ARIMA models.
//!
//! The estimator is the single numeric primitive the identification loop
//! calls; the finalizer wraps it with the root-handling corrections applied
//! after each nonlinear fit.

pub mod estimator;
pub mod finalizer;
pub mod optimizer;
pub mod roots;

pub use estimator::{estimate, Estimation, Precision};
pub use finalizer::FinalEstimator;
