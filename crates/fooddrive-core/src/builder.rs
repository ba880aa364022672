//! Prediction request builder: raw form input → [`FeatureRecord`].
//!
//! Coerces each raw value according to its [`FieldKind`], clamps slider
//! values to their bounds, checks enumerated values against the option sets
//! read from the dataset, and emits the record in the schema's training
//! order regardless of the order the inputs arrived in.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::error::{PredictionError, ValidationError, ValidationKind};
use crate::record::{FeatureRecord, FieldValue};
use crate::schema::{FeatureSchema, FieldKind, FieldSpec};

/// Untyped form input: field name → text as the user entered it.
pub type RawFields = BTreeMap<String, String>;

/// Builds feature records for one schema.
///
/// Enumerated fields are checked against the option set registered for them
/// with [`with_options`](Self::with_options). A field with no registered set
/// is not checked, so callers wiring a dataset in must register every
/// enumerated field.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    schema: FeatureSchema,
    options: HashMap<String, HashSet<String>>,
}

impl RequestBuilder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            options: HashMap::new(),
        }
    }

    /// Register the valid values of an enumerated field.
    pub fn with_options<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.insert(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn has_options(&self, field: &str) -> bool {
        self.options.contains_key(field)
    }

    /// Validate and assemble one request.
    pub fn build(&self, raw: &RawFields) -> Result<FeatureRecord, PredictionError> {
        if let Some(extra) = raw.keys().find(|k| self.schema.field(k).is_none()) {
            return Err(ValidationError::new(
                extra.as_str(),
                ValidationKind::UnexpectedField,
                raw.get(extra).map(String::as_str),
            )
            .into());
        }

        let mut record = FeatureRecord::new();
        for spec in &self.schema.fields {
            let untrimmed = raw.get(&spec.name).map(String::as_str);
            let input = untrimmed.map(str::trim).filter(|s| !s.is_empty());
            let value = match spec.kind {
                FieldKind::Enumerated => self.choose(spec, untrimmed, input)?,
                _ => self.coerce(spec, input)?,
            };
            record.push(spec.name.as_str(), value);
        }
        Ok(record)
    }

    /// Match an enumerated value against its options.
    ///
    /// Options keep any padding they have in the dataset, so the value as
    /// submitted is tried first and the trimmed value second.
    fn choose(
        &self,
        spec: &FieldSpec,
        untrimmed: Option<&str>,
        input: Option<&str>,
    ) -> Result<FieldValue, PredictionError> {
        let field = spec.name.as_str();
        let text = require(field, input)?;
        let Some(allowed) = self.options.get(field) else {
            return Ok(FieldValue::Text(text.to_string()));
        };
        match untrimmed.filter(|u| allowed.contains(*u)) {
            Some(exact) => Ok(FieldValue::Text(exact.to_string())),
            None if allowed.contains(text) => Ok(FieldValue::Text(text.to_string())),
            None => Err(PredictionError::unknown_category(field, text)),
        }
    }

    fn coerce(&self, spec: &FieldSpec, input: Option<&str>) -> Result<FieldValue, PredictionError> {
        let field = spec.name.as_str();
        match &spec.kind {
            FieldKind::Enumerated => Ok(FieldValue::Text(require(field, input)?.to_string())),
            FieldKind::FreeText => Ok(FieldValue::Text(require(field, input)?.to_string())),
            FieldKind::Number { min, max } => {
                let text = require(field, input)?;
                let parsed = parse_number(text)
                    .ok_or_else(|| ValidationError::new(field, ValidationKind::NotANumber, input))?;
                let mut value = parsed;
                if let Some(lo) = min {
                    value = value.max(*lo);
                }
                if let Some(hi) = max {
                    value = value.min(*hi);
                }
                if value != parsed {
                    debug!(field, input = parsed, clamped = value, "clamped number field");
                }
                Ok(FieldValue::Number(value))
            }
            FieldKind::Integer { min, max, default } => {
                let parsed = match (input, default) {
                    (None, Some(d)) => *d,
                    _ => parse_integer(field, require(field, input)?)?,
                };
                let mut value = parsed;
                if let Some(lo) = min {
                    value = value.max(*lo);
                }
                if let Some(hi) = max {
                    value = value.min(*hi);
                }
                if value != parsed {
                    debug!(field, input = parsed, clamped = value, "clamped integer field");
                }
                Ok(FieldValue::Integer(value))
            }
        }
    }
}

fn require<'a>(field: &str, input: Option<&'a str>) -> Result<&'a str, ValidationError> {
    input.ok_or_else(|| ValidationError::new(field, ValidationKind::Missing, None))
}

/// Parse a decimal, tolerating a leading `$` and thousands separators.
fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_integer(field: &str, text: &str) -> Result<i64, ValidationError> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    if let Ok(v) = cleaned.parse::<i64>() {
        return Ok(v);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        Ok(v) if v.is_finite() => Err(ValidationError::new(
            field,
            ValidationKind::NotAnInteger,
            Some(text),
        )),
        _ => Err(ValidationError::new(
            field,
            ValidationKind::NotANumber,
            Some(text),
        )),
    }
}
