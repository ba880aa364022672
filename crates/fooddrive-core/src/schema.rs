//! Feature schema definitions for model versions.
//!
//! A [`FeatureSchema`] records exactly what one trained artifact expects: the
//! field names in training order, how each raw input is coerced, and whether
//! the artifact exposes a separate preprocessing stage. Request building and
//! inference are generic over this configuration, so deploying a new model
//! version means shipping a new schema file rather than new code.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Names of the built-in schema presets accepted by [`FeatureSchema::resolve`].
pub const PRESETS: &[&str] = &["six-field", "ten-field"];

/// How a raw form value is coerced into a [`FieldValue`](crate::FieldValue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Selection input: value must be one of the dataset's observed values.
    Enumerated,
    /// Text input passed through unchecked; the artifact's encoder is the only gate.
    FreeText,
    /// Decimal input, clamped to the bounds that are present.
    Number {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Slider input, clamped to the bounds that are present.
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
        /// Initial slider position; used when the field is omitted.
        #[serde(default)]
        default: Option<i64>,
    },
}

impl FieldKind {
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Enumerated | Self::FreeText)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enumerated => "enumerated",
            Self::FreeText => "free_text",
            Self::Number { .. } => "number",
            Self::Integer { .. } => "integer",
        }
    }
}

/// One input field of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Dataset column that supplies options for enumerated fields. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            source_column: None,
        }
    }

    pub fn source_column(&self) -> &str {
        self.source_column.as_deref().unwrap_or(&self.name)
    }
}

/// Whether the artifact exposes its preprocessor separately from the regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLayout {
    /// Separate preprocessor and regressor stages.
    Staged,
    /// A single predictor that encodes internally.
    Combined,
}

impl StageLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Combined => "combined",
        }
    }
}

/// The input contract of one trained model version.
///
/// `fields` is in training order. That order is what the artifact consumes,
/// and it need not match the order a form displays its inputs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub name: String,
    pub layout: StageLayout,
    pub fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "six-field" => Some(six_field()),
            "ten-field" => Some(ten_field()),
            _ => None,
        }
    }

    /// Resolve a preset name, or else treat `spec` as a path to a JSON schema file.
    pub fn resolve(spec: &str) -> Result<Self, SchemaError> {
        match Self::preset(spec) {
            Some(schema) => Ok(schema),
            None => Self::from_path(Path::new(spec)),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        if !path.exists() {
            return Err(SchemaError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Check internal consistency: non-empty, unique names, sane bounds.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::Invalid(format!(
                "schema '{}' declares no fields",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::Invalid("empty field name".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::Invalid(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
            match &field.kind {
                FieldKind::Number { min, max } => {
                    if min.iter().chain(max).any(|b| !b.is_finite()) {
                        return Err(SchemaError::Invalid(format!(
                            "field '{}': bounds must be finite",
                            field.name
                        )));
                    }
                    if let (Some(lo), Some(hi)) = (min, max)
                        && lo > hi
                    {
                        return Err(SchemaError::Invalid(format!(
                            "field '{}': min {lo} exceeds max {hi}",
                            field.name
                        )));
                    }
                }
                FieldKind::Integer { min, max, default } => {
                    if let (Some(lo), Some(hi)) = (min, max)
                        && lo > hi
                    {
                        return Err(SchemaError::Invalid(format!(
                            "field '{}': min {lo} exceeds max {hi}",
                            field.name
                        )));
                    }
                    if let Some(d) = default
                        && (min.is_some_and(|lo| *d < lo) || max.is_some_and(|hi| *d > hi))
                    {
                        return Err(SchemaError::Invalid(format!(
                            "field '{}': default {d} outside bounds",
                            field.name
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Fields whose options come from the dataset.
    pub fn enumerated_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Enumerated))
    }

    /// Dataset columns that must be read as text so that options enumerate verbatim.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.kind.is_categorical())
            .map(|f| f.source_column().to_string())
            .collect()
    }
}

fn slider(min: i64, max: i64, default: i64) -> FieldKind {
    FieldKind::Integer {
        min: Some(min),
        max: Some(max),
        default: Some(default),
    }
}

/// The 2024 deployment: three selections and three sliders, staged artifact.
///
/// Training order interleaves the sliders between the selections; the form
/// shows Neighbourhood, Stake, Route, then the sliders.
fn six_field() -> FeatureSchema {
    FeatureSchema {
        name: "six-field".into(),
        layout: StageLayout::Staged,
        fields: vec![
            FieldSpec::new("Neighbourhood", FieldKind::Enumerated),
            FieldSpec::new("New Route Number/Name", FieldKind::Enumerated),
            FieldSpec::new("Routes Completed", slider(1, 10, 5)),
            FieldSpec::new("Doors in Route", slider(10, 500, 100)),
            FieldSpec::new("Time Spent", slider(10, 300, 60)),
            FieldSpec::new("Stake", FieldKind::Enumerated),
        ],
    }
}

/// Volunteer-count variant with free-text ward and route, combined artifact.
fn ten_field() -> FeatureSchema {
    FeatureSchema {
        name: "ten-field".into(),
        layout: StageLayout::Combined,
        fields: vec![
            FieldSpec::new("Neighbourhood", FieldKind::Enumerated),
            FieldSpec::new("Stake", FieldKind::Enumerated),
            FieldSpec::new("Ward/Branch", FieldKind::FreeText),
            FieldSpec::new("Route", FieldKind::FreeText),
            FieldSpec::new(
                "Assessed Value",
                FieldKind::Number {
                    min: Some(0.0),
                    max: None,
                },
            ),
            FieldSpec::new("Routes Completed", slider(1, 10, 5)),
            FieldSpec::new("Time Spent", slider(10, 300, 60)),
            FieldSpec::new("Doors in Route", slider(10, 500, 100)),
            FieldSpec::new("Adult Volunteers", slider(1, 50, 2)),
            FieldSpec::new("Youth Volunteers", slider(0, 50, 0)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for name in PRESETS {
            let schema = FeatureSchema::preset(name).unwrap();
            schema.validate().unwrap();
            assert_eq!(&schema.name, name);
        }
    }

    #[test]
    fn six_field_training_order() {
        let schema = FeatureSchema::preset("six-field").unwrap();
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(
            names,
            [
                "Neighbourhood",
                "New Route Number/Name",
                "Routes Completed",
                "Doors in Route",
                "Time Spent",
                "Stake"
            ]
        );
        assert_eq!(schema.layout, StageLayout::Staged);
        assert_eq!(schema.enumerated_fields().count(), 3);
    }

    #[test]
    fn ten_field_has_free_text_and_combined_layout() {
        let schema = FeatureSchema::preset("ten-field").unwrap();
        assert_eq!(schema.fields.len(), 10);
        assert_eq!(schema.layout, StageLayout::Combined);
        assert_eq!(schema.field("Route").unwrap().kind, FieldKind::FreeText);
        // Free-text columns still read as text from the dataset.
        assert!(schema.categorical_columns().contains(&"Route".to_string()));
    }

    #[test]
    fn parse_json_schema() {
        let json = r#"{
            "name": "custom",
            "layout": "combined",
            "fields": [
                {"name": "Neighbourhood", "kind": {"type": "enumerated"}, "source_column": "Area"},
                {"name": "Time Spent", "kind": {"type": "integer", "min": 10, "max": 300}},
                {"name": "Assessed Value", "kind": {"type": "number"}}
            ]
        }"#;
        let schema = FeatureSchema::from_json_str(json).unwrap();
        assert_eq!(schema.layout, StageLayout::Combined);
        assert_eq!(schema.fields[0].source_column(), "Area");
        assert_eq!(schema.fields[1].source_column(), "Time Spent");
        assert_eq!(
            schema.fields[2].kind,
            FieldKind::Number {
                min: None,
                max: None
            }
        );
    }

    #[test]
    fn rejects_duplicate_fields() {
        let json = r#"{
            "name": "dup",
            "layout": "staged",
            "fields": [
                {"name": "Stake", "kind": {"type": "enumerated"}},
                {"name": "Stake", "kind": {"type": "free_text"}}
            ]
        }"#;
        let err = FeatureSchema::from_json_str(json).unwrap_err();
        assert!(matches!(err, SchemaError::Invalid(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn rejects_inverted_bounds_and_bad_default() {
        let inverted = r#"{"name": "x", "layout": "staged",
            "fields": [{"name": "a", "kind": {"type": "integer", "min": 9, "max": 1}}]}"#;
        assert!(FeatureSchema::from_json_str(inverted).is_err());

        let bad_default = r#"{"name": "x", "layout": "staged",
            "fields": [{"name": "a", "kind": {"type": "integer", "min": 1, "max": 9, "default": 20}}]}"#;
        assert!(FeatureSchema::from_json_str(bad_default).is_err());
    }

    #[test]
    fn rejects_non_finite_number_bounds() {
        let mut schema = FeatureSchema::preset("ten-field").unwrap();
        let field = schema.fields.iter_mut().find(|f| f.name == "Assessed Value").unwrap();
        field.kind = FieldKind::Number {
            min: Some(f64::NAN),
            max: None,
        };
        let err = schema.validate().unwrap_err();
        assert!(matches!(err, SchemaError::Invalid(msg) if msg.contains("finite")));

        let field = schema.fields.iter_mut().find(|f| f.name == "Assessed Value").unwrap();
        field.kind = FieldKind::Number {
            min: Some(0.0),
            max: Some(f64::INFINITY),
        };
        assert!(schema.validate().is_err());
    }

    #[test]
    fn rejects_empty_schema() {
        let json = r#"{"name": "empty", "layout": "staged", "fields": []}"#;
        assert!(FeatureSchema::from_json_str(json).is_err());
    }

    #[test]
    fn resolve_missing_path() {
        let err = FeatureSchema::resolve("/nonexistent/schema.json").unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(_)));
    }

    #[test]
    fn resolve_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("schema.json");
        let schema = FeatureSchema::preset("ten-field").unwrap();
        std::fs::write(&path, serde_json::to_string_pretty(&schema).unwrap()).unwrap();

        let loaded = FeatureSchema::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, schema);
    }
}
