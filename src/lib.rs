//! Automatic identification and estimation of regression-ARIMA models.
//!
//! The crate fits seasonal ARIMA models with a regression part covering
//! calendar effects (trading or working days, leap year, Easter) and
//! automatically detected outliers. The [`ami::AmiEngine`] drives the full
//! identification loop: transformation choice, differencing selection,
//! ARMA order identification, regression significance testing and outlier
//! detection, with the airline model as benchmark and fallback.
//!
//! ```no_run
//! use regarima::prelude::*;
//!
//! # fn main() -> regarima::error::Result<()> {
//! let data = TsData::monthly(vec![0.0; 120], 2015)?;
//! let result = AmiEngine::new(RegArimaSpec::default()).run(&data)?;
//! println!("{} ({:?})", result.model.orders(), result.status);
//! # Ok(())
//! # }
//! ```

pub mod ami;
pub mod calendar;
pub mod config;
pub mod error;
pub mod estimation;
pub mod model;
pub mod series;
pub mod stats;
pub mod transform;

pub mod prelude {
    pub use crate::ami::{AmiEngine, AmiResult, AmiStatus};
    pub use crate::config::{
        ArmaPolicy, DifferencingPolicy, OutlierPolicy, RegArimaSpec, RegressionTestMethod,
        TradingDaysOption,
    };
    pub use crate::error::{RegArimaError, Result};
    pub use crate::model::orders::SarimaOrders;
    pub use crate::model::variables::{OutlierKind, Variable};
    pub use crate::model::ModelDescription;
    pub use crate::series::{EstimationSpan, TsData};
    pub use crate::stats::tests::LjungBoxResult;
    pub use crate::transform::TransformPolicy;
}
