use std::fmt;

use thiserror::Error;

/// Why a raw form field could not be turned into a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Field absent or blank.
    Missing,
    NotANumber,
    NotAnInteger,
    /// Raw input named a field the schema does not declare.
    UnexpectedField,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::NotANumber => "not a number",
            Self::NotAnInteger => "not a whole number",
            Self::UnexpectedField => "unexpected field",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field failed coercion in the request builder.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}' is {kind} (input: {input:?})")]
pub struct ValidationError {
    pub field: String,
    pub kind: ValidationKind,
    /// The raw text the user submitted, if any.
    pub input: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ValidationKind, input: Option<&str>) -> Self {
        Self {
            field: field.into(),
            kind,
            input: input.map(str::to_string),
        }
    }
}

/// Per-request failure of the build + run path.
///
/// Every variant is recoverable: the service stays usable for the next request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The record's fields, order, or value types differ from what the artifact was fitted on.
    #[error("schema mismatch: {detail}")]
    SchemaMismatch {
        field: Option<String>,
        detail: String,
    },

    #[error("unknown category {value:?} for field '{field}'")]
    UnknownCategory { field: String, value: String },

    #[error("unexpected pipeline error: {0}")]
    Unexpected(String),

    /// The model artifact failed to load at startup (or on first use).
    #[error("prediction unavailable: {0}")]
    Unavailable(String),
}

impl PredictionError {
    pub fn schema_mismatch(field: Option<&str>, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            field: field.map(str::to_string),
            detail: detail.into(),
        }
    }

    pub fn unknown_category(field: &str, value: &str) -> Self {
        Self::UnknownCategory {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// True for errors caused by what the user typed, as opposed to the model or its files.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::SchemaMismatch { .. } | Self::UnknownCategory { .. }
        )
    }
}

/// Failure to read or parse a feature schema definition.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid schema json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid schema: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_names_field() {
        let err = ValidationError::new("Assessed Value", ValidationKind::NotANumber, Some("abc"));
        assert_eq!(
            err.to_string(),
            "field 'Assessed Value' is not a number (input: Some(\"abc\"))"
        );
    }

    #[test]
    fn input_error_classification() {
        let v: PredictionError =
            ValidationError::new("Stake", ValidationKind::Missing, None).into();
        assert!(v.is_input_error());
        assert!(PredictionError::unknown_category("Neighbourhood", "Nowhere").is_input_error());
        assert!(PredictionError::schema_mismatch(None, "width").is_input_error());
        assert!(!PredictionError::Unexpected("boom".into()).is_input_error());
        assert!(!PredictionError::Unavailable("missing".into()).is_input_error());
    }
}
