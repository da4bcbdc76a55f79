//! Automatic model identification.
//!
//! The engine iterates over transformation choice, differencing selection,
//! outlier detection, ARMA order identification and regression testing
//! until a candidate model passes the comparator, falling back to the
//! airline model when the search exhausts its budget.

pub mod comparator;
pub mod context;
pub mod controllers;
pub mod differencing;
pub mod engine;
pub mod order;
pub mod outliers;
pub mod regression;

pub use comparator::{Assessment, ModelComparator};
pub use context::RunContext;
pub use differencing::DifferencingSelector;
pub use engine::{AmiEngine, AmiResult, AmiStatus};
pub use order::OrderSelector;
pub use outliers::{OutlierDetector, OutlierHit};
pub use regression::RegressionTester;

/// Outcome of one processing step applied to the working model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingResult {
    /// The step ran and left the model as it found it.
    Unchanged,
    /// The step modified the model; dependent results are stale.
    Changed,
    /// The step could not complete; the model is untouched.
    Failed,
    /// The step declined to run in the current state.
    Unprocessed,
}

impl ProcessingResult {
    pub fn changed(self) -> bool {
        self == ProcessingResult::Changed
    }
}
