//! In-memory donation dataset backed by Arrow record batches.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, Float64Array, LargeStringArray, StringArray};
use arrow::compute::cast;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use tracing::{info, warn};

use crate::encoding::TextEncoding;
use crate::stats::{ColumnSummary, Histogram};
use crate::DataLoadError;

const CSV_BATCH_SIZE: usize = 8192;

/// How to read a dataset file.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub encoding: TextEncoding,
    pub delimiter: u8,
    /// Columns forced to `Utf8` instead of inferred, so that values like
    /// route number `12` enumerate as the text `12`.
    pub categorical_columns: Vec<String>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::default(),
            delimiter: b',',
            categorical_columns: Vec::new(),
        }
    }
}

impl DatasetOptions {
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only tabular dataset, loaded once and shared.
///
/// Column types are inferred from the file except for the configured
/// categorical columns, which are always text.
#[derive(Debug)]
pub struct Dataset {
    path: PathBuf,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Dataset {
    /// Load a delimited file with a header row.
    pub fn load(path: &Path, options: &DatasetOptions) -> Result<Self, DataLoadError> {
        if !path.exists() {
            return Err(DataLoadError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let text = options.encoding.decode(&bytes)?;
        if text.trim().is_empty() {
            return Err(DataLoadError::Empty(path.to_path_buf()));
        }
        let dataset = Self::from_text(path, &text, options)?;
        info!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.schema.fields().len(),
            encoding = %options.encoding,
            "loaded dataset"
        );
        Ok(dataset)
    }

    fn from_text(path: &Path, text: &str, options: &DatasetOptions) -> Result<Self, DataLoadError> {
        let format = Format::default()
            .with_header(true)
            .with_delimiter(options.delimiter);
        let (inferred, _) = format.infer_schema(Cursor::new(text.as_bytes()), None)?;

        for col in &options.categorical_columns {
            if inferred.index_of(col).is_err() {
                warn!(
                    column = %col,
                    path = %path.display(),
                    "categorical column missing from dataset"
                );
            }
        }

        let fields: Vec<Field> = inferred
            .fields()
            .iter()
            .map(|f| {
                if options.categorical_columns.iter().any(|c| c == f.name()) {
                    Field::new(f.name(), DataType::Utf8, true)
                } else {
                    f.as_ref().clone()
                }
            })
            .collect();
        let schema: SchemaRef = Arc::new(Schema::new(fields));

        let reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .with_delimiter(options.delimiter)
            .with_batch_size(CSV_BATCH_SIZE)
            .build(Cursor::new(text.as_bytes()))?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            batches,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn row_count(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.schema.index_of(column).is_ok()
    }

    fn column_index(&self, column: &str) -> Result<usize, DataLoadError> {
        self.schema
            .index_of(column)
            .map_err(|_| DataLoadError::ColumnNotFound(column.to_string()))
    }

    // ── Option enumeration ──

    /// Distinct non-null values of a column in order of first occurrence.
    ///
    /// Text columns yield their values verbatim; other types go through
    /// Arrow's display formatting.
    pub fn enumerate_values(&self, column: &str) -> Result<Vec<String>, DataLoadError> {
        let idx = self.column_index(column)?;
        let mut seen = HashSet::new();
        let mut values = Vec::new();

        for batch in &self.batches {
            let col = batch.column(idx);
            for row in 0..col.len() {
                if col.is_null(row) {
                    continue;
                }
                let value = cell_to_string(col.as_ref(), row)?;
                if seen.insert(value.clone()) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    // ── Numeric summaries ──

    /// Non-null values of a numeric column as `f64`, plus the null count.
    pub fn numeric_values(&self, column: &str) -> Result<(Vec<f64>, usize), DataLoadError> {
        let idx = self.column_index(column)?;
        let data_type = self.schema.field(idx).data_type();
        if !data_type.is_numeric() {
            return Err(DataLoadError::NotNumeric {
                column: column.to_string(),
                data_type: data_type.to_string(),
            });
        }

        let mut values = Vec::with_capacity(self.row_count());
        let mut nulls = 0;
        for batch in &self.batches {
            let casted = cast(batch.column(idx), &DataType::Float64)?;
            let floats = casted
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| DataLoadError::InvalidArgument("cast did not yield f64".into()))?;
            nulls += floats.null_count();
            values.extend(floats.iter().flatten());
        }
        Ok((values, nulls))
    }

    pub fn describe(&self, column: &str) -> Result<ColumnSummary, DataLoadError> {
        let (values, nulls) = self.numeric_values(column)?;
        Ok(ColumnSummary::from_values(&values, nulls))
    }

    pub fn histogram(&self, column: &str, bins: usize) -> Result<Histogram, DataLoadError> {
        if bins == 0 {
            return Err(DataLoadError::InvalidArgument(
                "histogram needs at least one bin".into(),
            ));
        }
        let (values, _) = self.numeric_values(column)?;
        Ok(Histogram::from_values(&values, bins))
    }
}

fn cell_to_string(col: &dyn Array, row: usize) -> Result<String, DataLoadError> {
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Ok(arr.value(row).to_string());
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Ok(arr.value(row).to_string());
    }
    let options = FormatOptions::default();
    let formatter = ArrayFormatter::try_new(col, &options)?;
    Ok(formatter.value(row).to_string())
}
