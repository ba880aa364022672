//! Preprocessor stage: named feature record → positional encoded vector.
//!
//! This is the single place where a staged artifact turns names into
//! positions, so it insists that the record carries exactly the fitted
//! columns in the fitted order. A permuted record is rejected here rather
//! than scored silently against the wrong coefficients.

use std::collections::HashSet;

use fooddrive_core::{FeatureRecord, FieldValue, PredictionError};
use serde::{Deserialize, Serialize};

/// Output of the preprocessor, input of the regressor.
pub type EncodedVector = Vec<f64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Reject categories not seen at fit time.
    #[default]
    Error,
    /// Encode unseen categories as all zeros.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    OneHot {
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    StandardScale {
        mean: f64,
        scale: f64,
    },
    Passthrough,
}

impl TransformOp {
    fn width(&self) -> usize {
        match self {
            Self::OneHot { categories, .. } => categories.len(),
            Self::StandardScale { .. } | Self::Passthrough => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransform {
    pub column: String,
    #[serde(flatten)]
    pub op: TransformOp,
}

/// Fitted per-column transforms, concatenated in declaration order.
///
/// Columns listed in `feature_names_in` without a transform are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub feature_names_in: Vec<String>,
    pub transforms: Vec<ColumnTransform>,
}

impl ColumnTransformer {
    /// Width of the encoded vector.
    pub fn output_width(&self) -> usize {
        self.transforms.iter().map(|t| t.op.width()).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.feature_names_in.is_empty() {
            return Err("preprocessor has no input features".into());
        }
        let mut names = HashSet::new();
        for name in &self.feature_names_in {
            if !names.insert(name.as_str()) {
                return Err(format!("duplicate input feature '{name}'"));
            }
        }
        for t in &self.transforms {
            if !names.contains(t.column.as_str()) {
                return Err(format!(
                    "transform on '{}' which is not an input feature",
                    t.column
                ));
            }
            match &t.op {
                TransformOp::OneHot { categories, .. } => {
                    if categories.is_empty() {
                        return Err(format!("one-hot on '{}' has no categories", t.column));
                    }
                    let unique: HashSet<&String> = categories.iter().collect();
                    if unique.len() != categories.len() {
                        return Err(format!("one-hot on '{}' repeats a category", t.column));
                    }
                }
                TransformOp::StandardScale { mean, scale } => {
                    if !mean.is_finite() || !scale.is_finite() || *scale == 0.0 {
                        return Err(format!("scaler on '{}' has invalid parameters", t.column));
                    }
                }
                TransformOp::Passthrough => {}
            }
        }
        Ok(())
    }

    /// Encode one record.
    pub fn transform(&self, record: &FeatureRecord) -> Result<EncodedVector, PredictionError> {
        self.check_columns(record)?;

        let mut out = Vec::with_capacity(self.output_width());
        for t in &self.transforms {
            let value = record.get(&t.column).ok_or_else(|| {
                PredictionError::schema_mismatch(Some(t.column.as_str()), "missing column")
            })?;
            match &t.op {
                TransformOp::OneHot {
                    categories,
                    handle_unknown,
                } => {
                    let text = value
                        .as_text()
                        .ok_or_else(|| type_mismatch(&t.column, "text", value))?;
                    let hit = categories.iter().position(|c| c == text);
                    if hit.is_none() && *handle_unknown == HandleUnknown::Error {
                        return Err(PredictionError::unknown_category(&t.column, text));
                    }
                    out.extend(
                        (0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }),
                    );
                }
                TransformOp::StandardScale { mean, scale } => {
                    let v = value
                        .as_f64()
                        .ok_or_else(|| type_mismatch(&t.column, "a number", value))?;
                    out.push((v - mean) / scale);
                }
                TransformOp::Passthrough => {
                    let v = value
                        .as_f64()
                        .ok_or_else(|| type_mismatch(&t.column, "a number", value))?;
                    out.push(v);
                }
            }
        }
        Ok(out)
    }

    /// The record must carry exactly the fitted columns, in the fitted order.
    fn check_columns(&self, record: &FeatureRecord) -> Result<(), PredictionError> {
        for name in &self.feature_names_in {
            if record.get(name).is_none() {
                return Err(PredictionError::schema_mismatch(
                    Some(name.as_str()),
                    "column missing from request",
                ));
            }
        }
        if let Some(extra) = record
            .names()
            .find(|n| !self.feature_names_in.iter().any(|f| f == n))
        {
            return Err(PredictionError::schema_mismatch(
                Some(extra),
                "column not seen when the model was fitted",
            ));
        }
        if !record.names().eq(self.feature_names_in.iter().map(String::as_str)) {
            return Err(PredictionError::schema_mismatch(
                None,
                format!(
                    "columns must be in fitted order {:?}, got {:?}",
                    self.feature_names_in,
                    record.names().collect::<Vec<_>>()
                ),
            ));
        }
        Ok(())
    }
}

fn type_mismatch(column: &str, expected: &str, got: &FieldValue) -> PredictionError {
    PredictionError::schema_mismatch(
        Some(column),
        format!("expected {expected}, got {}", got.type_name()),
    )
}
