pub mod builder;
pub mod error;
pub mod record;
pub mod report;
pub mod schema;

pub use builder::{RawFields, RequestBuilder};
pub use error::{PredictionError, SchemaError, ValidationError, ValidationKind};
pub use record::{FeatureRecord, FieldValue};
pub use report::{Severity, UserMessage, present};
pub use schema::{FeatureSchema, FieldKind, FieldSpec, StageLayout};
