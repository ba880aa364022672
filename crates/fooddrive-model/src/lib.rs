//! Model layer: artifact loading, preprocessing, inference, and the
//! process-scoped prediction service.

mod error;
pub use error::ModelLoadError;

pub mod artifact;
pub mod combined;
pub mod pipeline;
pub mod preprocess;
pub mod regressor;
pub mod service;

pub use artifact::{ArtifactMetadata, ModelArtifact};
pub use pipeline::run;
pub use service::PredictionService;
