//! Data Validation
//!
//! Provides range checking for the numeric fields of a raw voyage record.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, Validator};
