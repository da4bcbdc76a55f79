//! Working model description: SARIMA orders, regression variables and the
//! single mutable entity the identification loop edits in place.

pub mod description;
pub mod orders;
pub mod variables;

pub use description::ModelDescription;
pub use orders::SarimaOrders;
pub use variables::{OutlierKind, Variable, VariableRole};
