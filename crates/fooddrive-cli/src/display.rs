//! Plain-text rendering for the terminal.
//!
//! Card-style sections with a fixed label column, in the same layout for
//! dataset summaries, histograms, and the prediction form.

use arrow::util::pretty::pretty_format_batches;
use fooddrive_core::{FieldKind, FieldSpec, Severity, UserMessage};
use fooddrive_model::PredictionService;
use fooddrive_store::{ColumnSummary, Dataset, Histogram};

const MAX_LIST_ITEMS: usize = 10;
const BAR_WIDTH: usize = 40;

const ABSTRACT: &str = "\
The Edmonton Food Drive Project aims to automate route assignment and improve
pick-up efficiency based on area and donation volume. Insights from the model
predict future donation patterns and help refine strategies over time. It also
supports communication and coordination between Regional Coordinators, Stake
Food Drive Representatives, and Ward Food Drive Representatives.";

const WHAT_IT_DOES: &str = "\
The project uses machine learning on the donation data collected in 2023 and
2024 to improve drop-off and pick-up efficiency, plan routes, and allocate
volunteers and vehicles for a more effective food drive campaign.";

// ── About ──

pub fn print_about() {
    println!("=== Food Drive ===");
    println!();
    println!("Abstract");
    println!("{ABSTRACT}");
    println!();
    println!("What the project does");
    println!("{WHAT_IT_DOES}");
}

// ── Dataset ──

/// Print the dataset overview: shape, column types, numeric summaries.
pub fn print_dataset_card(dataset: &Dataset) {
    println!("=== {} ===", dataset.path().display());
    println!("{} rows", dataset.row_count());
    println!();

    println!("Columns");
    for field in dataset.schema().fields() {
        println!("  {:<26} {}", field.name(), field.data_type());
    }
    println!();

    let numeric: Vec<(&str, ColumnSummary)> = dataset
        .schema()
        .fields()
        .iter()
        .filter(|f| f.data_type().is_numeric())
        .filter_map(|f| {
            dataset
                .describe(f.name())
                .ok()
                .map(|s| (f.name().as_str(), s))
        })
        .collect();
    if numeric.is_empty() {
        return;
    }
    println!("Numeric Summary");
    println!(
        "  {:<26} {:>8} {:>6} {:>10} {:>10} {:>10}",
        "", "count", "nulls", "min", "max", "mean"
    );
    for (name, summary) in &numeric {
        println!("  {}", summary_row(name, summary));
    }
    println!();
}

fn summary_row(name: &str, s: &ColumnSummary) -> String {
    format!(
        "{:<26} {:>8} {:>6} {:>10} {:>10} {:>10}",
        name,
        s.count,
        s.nulls,
        opt_num(s.min),
        opt_num(s.max),
        opt_num(s.mean)
    )
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

/// Print the first `n` rows as an Arrow table.
pub fn print_head(dataset: &Dataset, n: usize) -> anyhow::Result<()> {
    let mut remaining = n;
    let mut head = Vec::new();
    for batch in dataset.batches() {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.num_rows());
        head.push(batch.slice(0, take));
        remaining -= take;
    }
    if head.is_empty() {
        return Ok(());
    }
    println!("{}", pretty_format_batches(&head)?);
    Ok(())
}

// ── Histogram ──

pub fn print_histogram(column: &str, histogram: &Histogram) {
    println!("=== {column} ===");
    if histogram.counts.is_empty() {
        println!("  (no values)");
        println!();
        return;
    }
    let peak = histogram.counts.iter().copied().max().unwrap_or(0);
    for (lo, hi, count) in histogram.bins() {
        println!(
            "  {:>10.2} .. {:<10.2} {:>6}  {}",
            lo,
            hi,
            count,
            "#".repeat(bar_len(count, peak))
        );
    }
    println!("  {} values", histogram.total());
    println!();
}

/// Bar length scaled so the fullest bin spans [`BAR_WIDTH`]. Non-empty bins get at least one mark.
fn bar_len(count: usize, peak: usize) -> usize {
    if count == 0 || peak == 0 {
        return 0;
    }
    (count * BAR_WIDTH / peak).max(1)
}

// ── Prediction form ──

/// Print every input of the loaded schema, in training order.
pub fn print_form(service: &PredictionService) {
    let schema = service.schema();
    println!("=== {} ({}) ===", schema.name, schema.layout.as_str());
    println!();
    for spec in &schema.fields {
        println!("  {:<26} {}", spec.name, describe_kind(spec));
        if let Some(options) = service.enumerate_values(&spec.name) {
            print_options(options, "    ");
        }
    }
    println!();
}

fn describe_kind(spec: &FieldSpec) -> String {
    match &spec.kind {
        FieldKind::Enumerated => "choice".to_string(),
        FieldKind::FreeText => "text".to_string(),
        FieldKind::Number { min, max } => format!("number{}", range(*min, *max)),
        FieldKind::Integer { min, max, default } => {
            let mut s = format!("whole number{}", range(*min, *max));
            if let Some(d) = default {
                s.push_str(&format!(", default {d}"));
            }
            s
        }
    }
}

fn range<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!(" {lo}..={hi}"),
        (Some(lo), None) => format!(" >= {lo}"),
        (None, Some(hi)) => format!(" <= {hi}"),
        (None, None) => String::new(),
    }
}

fn print_options(options: &[String], indent: &str) {
    for value in options.iter().take(MAX_LIST_ITEMS) {
        println!("{indent}{value}");
    }
    if options.len() > MAX_LIST_ITEMS {
        println!("{indent}... and {} more", options.len() - MAX_LIST_ITEMS);
    }
}

/// Print all values of one field, unabridged.
pub fn print_values(field: &str, values: &[String]) {
    println!("{field} ({}):", values.len());
    for value in values {
        println!("  {value}");
    }
}

// ── Outcome ──

pub fn print_message(message: &UserMessage) {
    match message.severity {
        Severity::Success => println!("{message}"),
        Severity::InputError | Severity::Failure => eprintln!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_to_peak() {
        assert_eq!(bar_len(10, 10), BAR_WIDTH);
        assert_eq!(bar_len(5, 10), BAR_WIDTH / 2);
        assert_eq!(bar_len(1, 1000), 1);
        assert_eq!(bar_len(0, 10), 0);
    }

    #[test]
    fn slider_description() {
        let spec = FieldSpec::new(
            "Time Spent",
            FieldKind::Integer {
                min: Some(10),
                max: Some(300),
                default: Some(60),
            },
        );
        assert_eq!(describe_kind(&spec), "whole number 10..=300, default 60");
        let spec = FieldSpec::new(
            "Assessed Value",
            FieldKind::Number {
                min: Some(0.0),
                max: None,
            },
        );
        assert_eq!(describe_kind(&spec), "number >= 0");
    }

    #[test]
    fn summary_row_handles_empty_column() {
        let row = summary_row("Doors in Route", &ColumnSummary::from_values(&[], 3));
        assert!(row.starts_with("Doors in Route"));
        assert!(row.trim_end().ends_with('-'));
    }
}
