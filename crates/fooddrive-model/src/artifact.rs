//! Serialized model artifacts.
//!
//! An artifact is a JSON document tagged by `layout`:
//!
//! - `staged`: a [`ColumnTransformer`] preprocessor and a [`Regressor`],
//!   invoked one after the other.
//! - `combined`: a [`CombinedPredictor`] that encodes its own inputs.
//!
//! Structure is checked once at load time, so a file that parses but cannot
//! serve predictions fails at startup rather than on the first request.

use std::io;
use std::path::Path;

use fooddrive_core::StageLayout;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::combined::CombinedPredictor;
use crate::preprocess::ColumnTransformer;
use crate::regressor::Regressor;
use crate::ModelLoadError;

/// Descriptive fields written by the training process. Not used for inference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedModel {
    #[serde(default)]
    pub metadata: ArtifactMetadata,
    pub preprocessor: ColumnTransformer,
    pub regressor: Regressor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedModel {
    #[serde(default)]
    pub metadata: ArtifactMetadata,
    pub predictor: CombinedPredictor,
}

/// A fitted model, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum ModelArtifact {
    Staged(StagedModel),
    Combined(CombinedModel),
}

impl ModelArtifact {
    /// Load and validate an artifact file.
    ///
    /// A transient read fault is retried once; anything else fails immediately.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.exists() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }
        let bytes = read_with_retry(path)?;
        let artifact = Self::from_slice(&bytes)?;
        info!(
            path = %path.display(),
            layout = artifact.layout().as_str(),
            regressor = artifact.regressor().kind(),
            inputs = artifact.input_columns().len(),
            "loaded model artifact"
        );
        Ok(artifact)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let artifact: Self = serde_json::from_slice(bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelLoadError> {
        Self::from_slice(json.as_bytes())
    }

    pub fn validate(&self) -> Result<(), ModelLoadError> {
        match self {
            Self::Staged(m) => {
                m.preprocessor.validate().map_err(ModelLoadError::Malformed)?;
                m.regressor
                    .validate(m.preprocessor.output_width())
                    .map_err(ModelLoadError::Malformed)
            }
            Self::Combined(m) => m.predictor.validate().map_err(ModelLoadError::Malformed),
        }
    }

    pub fn layout(&self) -> StageLayout {
        match self {
            Self::Staged(_) => StageLayout::Staged,
            Self::Combined(_) => StageLayout::Combined,
        }
    }

    /// The separate preprocessing stage, if this artifact has one.
    pub fn preprocessor(&self) -> Option<&ColumnTransformer> {
        match self {
            Self::Staged(m) => Some(&m.preprocessor),
            Self::Combined(_) => None,
        }
    }

    pub fn regressor(&self) -> &Regressor {
        match self {
            Self::Staged(m) => &m.regressor,
            Self::Combined(m) => &m.predictor.regressor,
        }
    }

    /// Column names the artifact was fitted on. Order matters for staged artifacts.
    pub fn input_columns(&self) -> &[String] {
        match self {
            Self::Staged(m) => &m.preprocessor.feature_names_in,
            Self::Combined(m) => &m.predictor.feature_order,
        }
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        match self {
            Self::Staged(m) => &m.metadata,
            Self::Combined(m) => &m.metadata,
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

fn read_with_retry(path: &Path) -> Result<Vec<u8>, ModelLoadError> {
    retry_once(|| std::fs::read(path), path)
}

fn retry_once<F>(mut read: F, path: &Path) -> Result<Vec<u8>, ModelLoadError>
where
    F: FnMut() -> io::Result<Vec<u8>>,
{
    match read() {
        Ok(bytes) => Ok(bytes),
        Err(e) if is_transient(&e) => {
            warn!(path = %path.display(), error = %e, "transient read failure, retrying once");
            Ok(read()?)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STAGED: &str = r#"{
        "layout": "staged",
        "metadata": {"name": "bags-2024", "target": "Donation Bags Collected"},
        "preprocessor": {
            "feature_names_in": ["Neighbourhood", "Time Spent"],
            "transforms": [
                {"column": "Neighbourhood", "op": "one_hot", "categories": ["Clareview", "Downtown"]},
                {"column": "Time Spent", "op": "standard_scale", "mean": 60.0, "scale": 30.0}
            ]
        },
        "regressor": {"kind": "linear", "coefficients": [5.0, 9.0, 4.0], "intercept": 20.0}
    }"#;

    const COMBINED: &str = r#"{
        "layout": "combined",
        "predictor": {
            "feature_order": ["Stake", "Time Spent"],
            "categories": {"Stake": ["A", "B"]},
            "regressor": {"kind": "gradient_boosting", "init": 30.0, "learning_rate": 0.5, "trees": [
                {"nodes": [{"feature": 0, "threshold": 0.5, "left": 1, "right": 2}, {"value": -2.0}, {"value": 4.0}]}
            ]}
        }
    }"#;

    #[test]
    fn parse_staged() {
        let a = ModelArtifact::from_json_str(STAGED).unwrap();
        assert_eq!(a.layout(), StageLayout::Staged);
        assert!(a.preprocessor().is_some());
        assert_eq!(a.regressor().kind(), "linear");
        assert_eq!(a.input_columns(), ["Neighbourhood", "Time Spent"]);
        assert_eq!(a.metadata().name.as_deref(), Some("bags-2024"));
    }

    #[test]
    fn parse_combined() {
        let a = ModelArtifact::from_json_str(COMBINED).unwrap();
        assert_eq!(a.layout(), StageLayout::Combined);
        assert!(a.preprocessor().is_none());
        assert_eq!(a.regressor().kind(), "gradient_boosting");
        assert_eq!(a.metadata(), &ArtifactMetadata::default());
    }

    #[test]
    fn missing_stage_is_parse_error() {
        let json = r#"{"layout": "staged", "regressor": {"kind": "linear", "coefficients": [], "intercept": 0}}"#;
        assert!(matches!(
            ModelArtifact::from_json_str(json),
            Err(ModelLoadError::Parse(_))
        ));
    }

    #[test]
    fn unknown_layout_is_parse_error() {
        let json = r#"{"layout": "pickle"}"#;
        assert!(matches!(
            ModelArtifact::from_json_str(json),
            Err(ModelLoadError::Parse(_))
        ));
    }

    #[test]
    fn coefficient_width_mismatch_is_malformed() {
        let json = STAGED.replace("[5.0, 9.0, 4.0]", "[5.0, 9.0]");
        assert!(matches!(
            ModelArtifact::from_json_str(&json),
            Err(ModelLoadError::Malformed(_))
        ));
    }

    #[test]
    fn load_missing_file_errors() {
        let result = ModelArtifact::load(Path::new("/nonexistent/model.json"));
        assert!(matches!(result, Err(ModelLoadError::NotFound(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STAGED.as_bytes()).unwrap();
        let a = ModelArtifact::load(file.path()).unwrap();
        assert_eq!(a.layout(), StageLayout::Staged);
    }

    #[test]
    fn load_garbage_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x80\x04\x95pickle bytes").unwrap();
        assert!(matches!(
            ModelArtifact::load(file.path()),
            Err(ModelLoadError::Parse(_))
        ));
    }

    #[test]
    fn transient_fault_retried_once() {
        let mut calls = 0;
        let bytes = retry_once(
            || {
                calls += 1;
                if calls == 1 {
                    Err(io::Error::from(io::ErrorKind::Interrupted))
                } else {
                    Ok(b"ok".to_vec())
                }
            },
            Path::new("model.json"),
        )
        .unwrap();
        assert_eq!(bytes, b"ok");
        assert_eq!(calls, 2);
    }

    #[test]
    fn persistent_transient_fault_gives_up() {
        let mut calls = 0;
        let result = retry_once(
            || {
                calls += 1;
                Err(io::Error::from(io::ErrorKind::TimedOut))
            },
            Path::new("model.json"),
        );
        assert!(matches!(result, Err(ModelLoadError::Io(_))));
        assert_eq!(calls, 2);
    }

    #[test]
    fn permanent_fault_not_retried() {
        let mut calls = 0;
        let result = retry_once(
            || {
                calls += 1;
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            },
            Path::new("model.json"),
        );
        assert!(matches!(result, Err(ModelLoadError::Io(_))));
        assert_eq!(calls, 1);
    }
}
