//! Statistical primitives: autocovariances, significance tests and the
//! seasonality pre-test.

pub mod acf;
pub mod seasonality;
pub mod tests;

pub use acf::{autocorrelations, autocovariances};
pub use seasonality::{test_seasonality, SeasonalityTest};
pub use tests::{f_p_value, ljung_box, t_p_value, LjungBoxResult};
