use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("dataset file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("dataset file is empty: {0}")]
    Empty(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset is not valid {encoding} (first bad byte at offset {offset})")]
    Encoding {
        encoding: &'static str,
        offset: usize,
    },

    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("column '{column}' is not numeric ({data_type})")]
    NotNumeric { column: String, data_type: String },

    #[error("{0}")]
    InvalidArgument(String),
}
