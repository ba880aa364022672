//! Dataset layer: CSV decoding into Arrow batches, option enumeration, EDA summaries.

mod error;
pub use error::DataLoadError;

mod dataset;
pub mod encoding;
pub mod stats;

pub use dataset::{Dataset, DatasetOptions};
pub use encoding::TextEncoding;
pub use stats::{ColumnSummary, Histogram};
