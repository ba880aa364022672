//! Numeric column summaries and equal-width histograms for the EDA view.

/// Count, nulls, and range of a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub nulls: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl ColumnSummary {
    pub fn from_values(values: &[f64], nulls: usize) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                nulls,
                min: None,
                max: None,
                mean: None,
            };
        }
        let (min, max) = bounds(values);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Self {
            count: values.len(),
            nulls,
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
        }
    }
}

/// Equal-width bins over `[min, max]`.
///
/// `edges` has one more entry than `counts`. Every bin is half-open except
/// the last, which also includes `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins. `bins` must be non-zero.
    ///
    /// With no values the histogram is empty; when all values are equal they
    /// land in a single bin.
    pub fn from_values(values: &[f64], bins: usize) -> Self {
        debug_assert!(bins > 0);
        if values.is_empty() {
            return Self {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        }

        let (min, max) = bounds(values);
        if min == max {
            return Self {
                edges: vec![min, max],
                counts: vec![values.len()],
            };
        }

        let width = (max - min) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { max } else { min + width * i as f64 })
            .collect();

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Self { edges, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Iterate `(lower, upper, count)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (self.edges[i], self.edges[i + 1], c))
    }
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
