//! Single-stage predictor that encodes its own inputs.
//!
//! Categorical columns are ordinal-encoded against the category lists stored
//! in the artifact; numeric columns pass straight through. Columns listed as
//! lenient encode an unseen value as `-1` instead of rejecting it.
//!
//! Fields are looked up by name and laid out in `feature_order` only here,
//! immediately before the regressor sees them.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use fooddrive_core::{FeatureRecord, PredictionError};
use serde::{Deserialize, Serialize};

use crate::regressor::Regressor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPredictor {
    pub feature_order: Vec<String>,
    /// Column → categories in code order. Columns absent here are numeric.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub lenient: BTreeSet<String>,
    pub regressor: Regressor,
}

impl CombinedPredictor {
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_order.is_empty() {
            return Err("combined predictor has no input features".into());
        }
        let names: HashSet<&str> = self.feature_order.iter().map(String::as_str).collect();
        if names.len() != self.feature_order.len() {
            return Err("combined predictor repeats an input feature".into());
        }
        if let Some(col) = self.categories.keys().find(|c| !names.contains(c.as_str())) {
            return Err(format!("categories given for unknown feature '{col}'"));
        }
        if let Some(col) = self.lenient.iter().find(|c| !self.categories.contains_key(*c)) {
            return Err(format!("lenient column '{col}' has no categories"));
        }
        self.regressor.validate(self.feature_order.len())
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<Vec<f64>, PredictionError> {
        if let Some(extra) = record
            .names()
            .find(|n| !self.feature_order.iter().any(|f| f == n))
        {
            return Err(PredictionError::schema_mismatch(
                Some(extra),
                "column not seen when the model was fitted",
            ));
        }

        let mut x = Vec::with_capacity(self.feature_order.len());
        for name in &self.feature_order {
            let value = record.get(name).ok_or_else(|| {
                PredictionError::schema_mismatch(Some(name.as_str()), "column missing from request")
            })?;
            let encoded = match self.categories.get(name) {
                Some(categories) => {
                    let text = value.as_text().ok_or_else(|| {
                        PredictionError::schema_mismatch(
                            Some(name.as_str()),
                            format!("expected text, got {}", value.type_name()),
                        )
                    })?;
                    match categories.iter().position(|c| c == text) {
                        Some(code) => code as f64,
                        None if self.lenient.contains(name) => -1.0,
                        None => return Err(PredictionError::unknown_category(name, text)),
                    }
                }
                None => value.as_f64().ok_or_else(|| {
                    PredictionError::schema_mismatch(
                        Some(name.as_str()),
                        format!("expected a number, got {}", value.type_name()),
                    )
                })?,
            };
            x.push(encoded);
        }
        self.regressor.predict(&x)
    }
}
