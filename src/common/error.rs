//! Error handling primitives shared across the core.
//!
//! Three families matter to callers: validation failures (client caused,
//! itemized), model load failures (fatal at startup) and inference failures
//! (per request, never crash the process).

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Stable error codes surfaced to the transport layer.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Input failed validation.
    InvalidInput = 1,
    /// A persisted artifact existed but could not be read.
    ModelLoad = 2,
    /// Inference was attempted before the model was ready.
    ModelMissing = 3,
    /// The model failed to score a feature vector.
    Inference = 4,
    /// Catch-all for configuration, IO and serialization faults.
    Internal = 5,
}

impl ErrorCode {
    /// HTTP-style status a transport should answer with.
    pub const fn status(self) -> u16 {
        match self {
            ErrorCode::Ok => 200,
            ErrorCode::InvalidInput => 422,
            ErrorCode::ModelLoad
            | ErrorCode::ModelMissing
            | ErrorCode::Inference
            | ErrorCode::Internal => 500,
        }
    }
}

/// One violated field constraint.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Every constraint an input record violated, not just the first.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, reason)])
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of the offending fields, in report order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.errors.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Canonical error type for the core.
#[derive(Debug, Error)]
pub enum PrepError {
    /// The request record violated the input contract.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A named artifact exists but could not be turned into a model.
    #[error("failed to load model from {path:?}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// No model has been constructed yet.
    #[error("no model is currently loaded")]
    ModelNotLoaded,

    /// Scoring failed for a single request.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Configuration could not be assembled.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type PrepResult<T> = Result<T, PrepError>;

impl PrepError {
    /// Model load helper.
    pub fn model_load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Inference helper.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Configuration helper.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PrepError::Validation(_) => ErrorCode::InvalidInput,
            PrepError::ModelLoad { .. } => ErrorCode::ModelLoad,
            PrepError::ModelNotLoaded => ErrorCode::ModelMissing,
            PrepError::Inference(_) => ErrorCode::Inference,
            PrepError::Config(_) | PrepError::Io(_) | PrepError::Serialization(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Check if the caller caused this error and may fix it by resubmitting.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PrepError::Validation(_))
    }

    /// Check if this is a server-side fault.
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Ok as u32, 0);
        assert_eq!(ErrorCode::InvalidInput as u32, 1);
        assert_eq!(ErrorCode::ModelLoad as u32, 2);
        assert_eq!(ErrorCode::ModelMissing as u32, 3);
        assert_eq!(ErrorCode::Inference as u32, 4);
        assert_eq!(ErrorCode::Internal as u32, 5);
    }

    #[test]
    fn statuses_split_client_and_server() {
        assert_eq!(ErrorCode::InvalidInput.status(), 422);
        assert_eq!(ErrorCode::Inference.status(), 500);
        assert_eq!(ErrorCode::ModelLoad.status(), 500);
        assert_eq!(ErrorCode::Ok.status(), 200);
    }

    #[test]
    fn validation_display_lists_every_field() {
        let err = ValidationError::new(vec![
            FieldError::new("order_hour", "must be between 0 and 23"),
            FieldError::new("day_of_week", "field required"),
        ]);
        assert_eq!(
            err.to_string(),
            "order_hour: must be between 0 and 23; day_of_week: field required"
        );
        assert_eq!(err.fields().collect::<Vec<_>>(), ["order_hour", "day_of_week"]);
    }

    #[test]
    fn classification() {
        let err = PrepError::from(ValidationError::single("item_count", "must be > 0"));
        assert!(err.is_client_error());
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        let err = PrepError::inference("boom");
        assert!(err.is_server_error());
        assert_eq!(err.to_string(), "inference failed: boom");

        let err = PrepError::model_load("/tmp/model.json", "bad json");
        assert_eq!(err.code(), ErrorCode::ModelLoad);
        assert!(err.to_string().contains("bad json"));
    }
}
