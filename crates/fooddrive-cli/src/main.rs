mod display;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use fooddrive_core::{FeatureSchema, RawFields, Severity};
use fooddrive_model::PredictionService;
use fooddrive_store::{Dataset, DatasetOptions, TextEncoding};
use tracing::{Level, info};

const DEFAULT_HISTOGRAM_COLUMNS: &[&str] = &["Donation Bags Collected", "Time to Complete (min)"];

#[derive(Parser)]
#[command(name = "fooddrive", version, about = "Food drive donation data and bag predictions")]
struct Cli {
    /// Donation dataset (delimited text with a header row).
    #[arg(long, global = true, env = "FOODDRIVE_DATA", default_value = "data_2024.csv")]
    data: PathBuf,

    /// Text encoding of the dataset: latin1, cp1252, or utf-8.
    #[arg(long, global = true, env = "FOODDRIVE_ENCODING", default_value = "latin1")]
    encoding: String,

    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,

    /// Model artifact (JSON).
    #[arg(long, global = true, env = "FOODDRIVE_MODEL", default_value = "model.json")]
    model: PathBuf,

    /// Schema preset (six-field, ten-field) or path to a JSON schema file.
    #[arg(long, global = true, env = "FOODDRIVE_SCHEMA", default_value = "six-field")]
    schema: String,

    /// Load the model at startup instead of on first prediction.
    #[arg(long, global = true)]
    eager: bool,

    /// Log more (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Project overview.
    About,
    /// Dataset shape, column types, and numeric summaries.
    Describe {
        /// Also print the first N rows.
        #[arg(long, default_value_t = 0)]
        head: usize,
    },
    /// Equal-width histogram of numeric columns.
    Histogram {
        /// Columns to bin. Defaults to bags collected and time to complete.
        columns: Vec<String>,
        #[arg(long, default_value_t = 20)]
        bins: usize,
    },
    /// List the prediction inputs and their options.
    Fields,
    /// All distinct values of a field or dataset column.
    Values { field: String },
    /// Predict donation bags for one route.
    Predict {
        /// Input as NAME=VALUE. Repeat for each field.
        #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    info!("fooddrive v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::About => {
            display::print_about();
        }
        Command::Describe { head } => {
            let dataset = load_dataset(&cli, &[])?;
            display::print_dataset_card(&dataset);
            if *head > 0 {
                display::print_head(&dataset, *head)?;
            }
        }
        Command::Histogram { columns, bins } => {
            let dataset = load_dataset(&cli, &[])?;
            let columns: Vec<&str> = if columns.is_empty() {
                DEFAULT_HISTOGRAM_COLUMNS.to_vec()
            } else {
                columns.iter().map(String::as_str).collect()
            };
            for column in columns {
                let histogram = dataset
                    .histogram(column, *bins)
                    .with_context(|| format!("binning column '{column}'"))?;
                display::print_histogram(column, &histogram);
            }
        }
        Command::Fields => {
            let service = open_service(&cli)?;
            display::print_form(&service);
        }
        Command::Values { field } => {
            let values = list_values(&cli, field)?;
            display::print_values(field, &values);
        }
        Command::Predict { fields } => {
            let service = open_service(&cli)?;
            let raw: RawFields = fields.iter().cloned().collect();
            let message = service.predict_and_present(&raw);
            display::print_message(&message);
            return Ok(match message.severity {
                Severity::Success => ExitCode::SUCCESS,
                Severity::InputError => ExitCode::from(2),
                Severity::Failure => ExitCode::FAILURE,
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}

// ── Setup ──

fn dataset_options(cli: &Cli, categorical: Vec<String>) -> anyhow::Result<DatasetOptions> {
    let encoding: TextEncoding = cli
        .encoding
        .parse()
        .with_context(|| format!("--encoding {}", cli.encoding))?;
    if !cli.delimiter.is_ascii() {
        bail!("--delimiter must be a single ASCII character, got {:?}", cli.delimiter);
    }
    Ok(DatasetOptions::default()
        .with_encoding(encoding)
        .with_delimiter(cli.delimiter as u8)
        .with_categorical_columns(categorical))
}

fn load_dataset(cli: &Cli, categorical: &[String]) -> anyhow::Result<Dataset> {
    let options = dataset_options(cli, categorical.to_vec())?;
    Dataset::load(&cli.data, &options)
        .with_context(|| format!("loading dataset {}", cli.data.display()))
}

fn load_schema(spec: &str) -> anyhow::Result<FeatureSchema> {
    FeatureSchema::resolve(spec).with_context(|| {
        if Path::new(spec).extension().is_some() {
            format!("reading schema file {spec}")
        } else {
            format!("unknown schema preset '{spec}'")
        }
    })
}

fn open_service(cli: &Cli) -> anyhow::Result<PredictionService> {
    let schema = load_schema(&cli.schema)?;
    let dataset = load_dataset(cli, &schema.categorical_columns())?;
    let service = PredictionService::new(schema, &dataset, &cli.model)
        .context("reading field options from the dataset")?;
    if cli.eager && service.is_available() {
        info!(model = %cli.model.display(), "model ready");
    }
    Ok(service)
}

/// Distinct values of a schema field, or of a dataset column by name.
fn list_values(cli: &Cli, field: &str) -> anyhow::Result<Vec<String>> {
    let schema = load_schema(&cli.schema)?;
    let column = schema.field(field).map_or(field, |s| s.source_column());
    let dataset = load_dataset(cli, &[column.to_string()])?;
    dataset
        .enumerate_values(column)
        .with_context(|| format!("enumerating column '{column}'"))
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
