//! Process-scoped prediction handle.
//!
//! Owns the request builder (with option sets read from the dataset) and the
//! model artifact. The artifact loads at most once, on the first call that
//! needs it or on an explicit [`PredictionService::load_model`]. A failed
//! load is kept and reported as unavailable on every later request; the rest
//! of the process keeps working.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use fooddrive_core::{
    FeatureRecord, FeatureSchema, PredictionError, RawFields, RequestBuilder, UserMessage,
    present,
};
use fooddrive_store::{DataLoadError, Dataset};
use tracing::{error, info, warn};

use crate::ModelLoadError;
use crate::artifact::ModelArtifact;
use crate::pipeline;

pub struct PredictionService {
    builder: RequestBuilder,
    options: HashMap<String, Vec<String>>,
    model_path: PathBuf,
    artifact: OnceLock<Result<ModelArtifact, ModelLoadError>>,
}

impl PredictionService {
    /// Read the option set of every enumerated field from `dataset`.
    ///
    /// Fails if a field's source column is missing from the dataset.
    pub fn new(
        schema: FeatureSchema,
        dataset: &Dataset,
        model_path: impl Into<PathBuf>,
    ) -> Result<Self, DataLoadError> {
        let mut builder = RequestBuilder::new(schema.clone());
        let mut options = HashMap::new();
        for spec in schema.enumerated_fields() {
            let values = dataset.enumerate_values(spec.source_column())?;
            info!(
                field = %spec.name,
                column = spec.source_column(),
                options = values.len(),
                "registered field options"
            );
            builder = builder.with_options(&spec.name, values.iter().cloned());
            options.insert(spec.name.clone(), values);
        }
        Ok(Self {
            builder,
            options,
            model_path: model_path.into(),
            artifact: OnceLock::new(),
        })
    }

    /// Wrap a builder whose options were registered elsewhere.
    pub fn from_builder(builder: RequestBuilder, model_path: impl Into<PathBuf>) -> Self {
        Self {
            builder,
            options: HashMap::new(),
            model_path: model_path.into(),
            artifact: OnceLock::new(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.builder.schema()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Options for an enumerated field, in dataset order.
    pub fn enumerate_values(&self, field: &str) -> Option<&[String]> {
        self.options.get(field).map(Vec::as_slice)
    }

    /// Load the artifact if that has not been attempted yet.
    pub fn load_model(&self) -> Result<&ModelArtifact, &ModelLoadError> {
        self.artifact
            .get_or_init(|| {
                let loaded = ModelArtifact::load(&self.model_path)
                    .and_then(|artifact| self.check_layout(artifact));
                if let Err(e) = &loaded {
                    error!(path = %self.model_path.display(), error = %e, "model unavailable");
                }
                loaded
            })
            .as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.load_model().is_ok()
    }

    fn check_layout(&self, artifact: ModelArtifact) -> Result<ModelArtifact, ModelLoadError> {
        let schema = self.schema();
        if artifact.layout() != schema.layout {
            return Err(ModelLoadError::layout_mismatch(
                schema.layout,
                artifact.layout(),
            ));
        }
        if !artifact
            .input_columns()
            .iter()
            .map(String::as_str)
            .eq(schema.field_names())
        {
            warn!(
                schema = %schema.name,
                artifact = ?artifact.input_columns(),
                "artifact inputs differ from schema fields, requests will be rejected"
            );
        }
        Ok(artifact)
    }

    /// Validate raw input without touching the model.
    pub fn build(&self, raw: &RawFields) -> Result<FeatureRecord, PredictionError> {
        self.builder.build(raw)
    }

    /// Build a record from raw input and run it through the model.
    ///
    /// Input errors are reported before the model is loaded.
    pub fn predict(&self, raw: &RawFields) -> Result<f64, PredictionError> {
        let record = self.builder.build(raw)?;
        let artifact = self
            .load_model()
            .map_err(|e| PredictionError::Unavailable(e.to_string()))?;
        pipeline::run(artifact, &record)
    }

    pub fn predict_and_present(&self, raw: &RawFields) -> UserMessage {
        present(&self.predict(raw))
    }
}
