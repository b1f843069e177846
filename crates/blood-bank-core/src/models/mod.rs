//! Domain models for the blood bank engine.

mod actor;
mod blood_type;
mod donor;
mod query;
mod request;
mod validation;

pub use actor::*;
pub use blood_type::*;
pub use donor::*;
pub use query::*;
pub use request::*;
pub use validation::{ValidationError, ValidationResult};

pub(crate) use validation::fold_case;
