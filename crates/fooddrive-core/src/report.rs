//! User-facing rendering of prediction outcomes.

use std::fmt;

use tracing::{error, warn};

use crate::error::{PredictionError, ValidationKind};

/// Label printed before a successful prediction.
pub const SUCCESS_PREFIX: &str = "Predicted Donation Bags";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    /// The user can fix the request and try again.
    InputError,
    /// Something outside the user's control went wrong.
    Failure,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InputError => "input-error",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub severity: Severity,
    pub text: String,
}

impl UserMessage {
    fn new(severity: Severity, text: String) -> Self {
        Self { severity, text }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render a prediction outcome for a non-technical user.
///
/// Internal diagnostics of unexpected failures are logged, never shown.
pub fn present(outcome: &Result<f64, PredictionError>) -> UserMessage {
    match outcome {
        Ok(value) => UserMessage::new(Severity::Success, format!("{SUCCESS_PREFIX}: {value:.2}")),
        Err(PredictionError::Validation(v)) => {
            let text = match v.kind {
                ValidationKind::Missing => {
                    format!("Input error: please provide a value for {}.", v.field)
                }
                ValidationKind::NotANumber => format!(
                    "Input error: {} must be a number (got \"{}\").",
                    v.field,
                    v.input.as_deref().unwrap_or_default()
                ),
                ValidationKind::NotAnInteger => format!(
                    "Input error: {} must be a whole number (got \"{}\").",
                    v.field,
                    v.input.as_deref().unwrap_or_default()
                ),
                ValidationKind::UnexpectedField => {
                    format!("Input error: {} is not an input of this model.", v.field)
                }
            };
            UserMessage::new(Severity::InputError, text)
        }
        Err(PredictionError::UnknownCategory { field, value }) => UserMessage::new(
            Severity::InputError,
            format!(
                "Input error: \"{value}\" is not a known {field}. Choose one of the listed options."
            ),
        ),
        Err(PredictionError::SchemaMismatch { field, detail }) => {
            warn!(field = field.as_deref(), detail = %detail, "schema mismatch");
            let text = match field {
                Some(field) => {
                    format!("Input error: {field} does not match what the model expects.")
                }
                None => "Input error: the submitted fields do not match what the model expects."
                    .to_string(),
            };
            UserMessage::new(Severity::InputError, text)
        }
        Err(PredictionError::Unavailable(detail)) => {
            error!(detail = %detail, "prediction requested while model unavailable");
            UserMessage::new(
                Severity::Failure,
                "Prediction is unavailable: the model could not be loaded.".to_string(),
            )
        }
        Err(PredictionError::Unexpected(detail)) => {
            error!(detail = %detail, "unexpected pipeline error");
            UserMessage::new(
                Severity::Failure,
                "An error occurred while making the prediction. Please try again later."
                    .to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn success_two_decimals() {
        let msg = present(&Ok(42.0));
        assert_eq!(msg.severity, Severity::Success);
        assert_eq!(msg.text, "Predicted Donation Bags: 42.00");

        assert_eq!(present(&Ok(17.456)).text, "Predicted Donation Bags: 17.46");
        assert_eq!(present(&Ok(0.004)).to_string(), "Predicted Donation Bags: 0.00");
    }

    #[test]
    fn not_a_number_names_field() {
        let err = ValidationError::new("AssessedValue", ValidationKind::NotANumber, Some("abc"));
        let msg = present(&Err(err.into()));
        assert_eq!(msg.severity, Severity::InputError);
        assert!(msg.text.contains("AssessedValue"));
        assert!(msg.text.contains("abc"));
        assert!(msg.text.contains("must be a number"));
    }

    #[test]
    fn missing_value_asks_for_field() {
        let err = ValidationError::new("Time Spent", ValidationKind::Missing, None);
        let msg = present(&Err(err.into()));
        assert_eq!(msg.severity, Severity::InputError);
        assert_eq!(msg.text, "Input error: please provide a value for Time Spent.");
    }

    #[test]
    fn unknown_category_distinct_from_type_error() {
        let unknown = present(&Err(PredictionError::unknown_category(
            "Neighbourhood",
            "Atlantis",
        )));
        let type_err = present(&Err(
            ValidationError::new("Neighbourhood", ValidationKind::NotANumber, Some("x")).into(),
        ));
        assert_eq!(unknown.severity, Severity::InputError);
        assert!(unknown.text.contains("Atlantis"));
        assert!(unknown.text.contains("not a known Neighbourhood"));
        assert_ne!(unknown.text, type_err.text);
    }

    #[test]
    fn schema_mismatch_is_input_error() {
        let msg = present(&Err(PredictionError::schema_mismatch(
            Some("Stake"),
            "expected text, got integer",
        )));
        assert_eq!(msg.severity, Severity::InputError);
        assert!(msg.text.contains("Stake"));
        assert!(!msg.text.contains("expected text"));
    }

    #[test]
    fn unexpected_error_hides_diagnostics() {
        let msg = present(&Err(PredictionError::Unexpected(
            "tree node 17 has child 9000 out of range".into(),
        )));
        assert_eq!(msg.severity, Severity::Failure);
        assert!(!msg.text.contains("9000"));
    }

    #[test]
    fn unavailable_message() {
        let msg = present(&Err(PredictionError::Unavailable("model.json not found".into())));
        assert_eq!(msg.severity, Severity::Failure);
        assert!(msg.text.contains("unavailable"));
        assert!(!msg.text.contains("model.json"));
    }
}
