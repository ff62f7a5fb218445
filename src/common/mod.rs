//! Shared utilities that glue the different domains together.
pub mod config;
pub mod error;
pub mod ids;
pub mod log;

pub use config::AppCfg;
pub use error::{ErrorCode, FieldError, PrepError, PrepResult, ValidationError};
