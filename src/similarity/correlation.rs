//! Correlation-based similarity between the sample columns of two matrices.
//!
//! Each column is standardized once (ranked first for Spearman), after which
//! every pairwise correlation is a dot product: the full similarity matrix is
//! `Zaᵀ · Zb`.
//!
//! # Missing values
//!
//! There is no pairwise deletion. A column containing NaN, or a column with
//! zero variance, has an undefined correlation with everything, so every cell
//! it takes part in is NaN. All other cells use the full feature axis.

use crate::data::AnnotatedMatrix;
use crate::error::{ConnectivityError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Correlation used to compare two profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Pearson correlation of average ranks.
    #[default]
    Spearman,
    /// Pearson product-moment correlation.
    Pearson,
}

impl SimilarityMetric {
    /// Get the name used in configuration and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spearman => "spearman",
            Self::Pearson => "pearson",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimilarityMetric {
    type Err = ConnectivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spearman" => Ok(Self::Spearman),
            "pearson" => Ok(Self::Pearson),
            other => Err(ConnectivityError::UnknownMetric {
                kind: "similarity",
                name: other.to_string(),
            }),
        }
    }
}

/// Average ranks (1-based), ties sharing the mean of the ranks they span.
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start;
        while end + 1 < n && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let avg = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = avg;
        }
        start = end + 1;
    }
    ranks
}

/// Center and scale a column to unit norm; NaN when the correlation is undefined.
fn standardize(values: Vec<f64>, metric: SimilarityMetric) -> Vec<f64> {
    let n = values.len();
    if n == 0 || values.iter().any(|v| !v.is_finite()) {
        return vec![f64::NAN; n];
    }

    let values = match metric {
        SimilarityMetric::Spearman => rank_average(&values),
        SimilarityMetric::Pearson => values,
    };

    let mean = values.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();

    if norm == 0.0 || !norm.is_finite() {
        return vec![f64::NAN; n];
    }
    centered.into_iter().map(|v| v / norm).collect()
}

fn standardize_columns(data: &DMatrix<f64>, metric: SimilarityMetric) -> DMatrix<f64> {
    let columns: Vec<Vec<f64>> = (0..data.ncols())
        .into_par_iter()
        .map(|j| standardize(data.column(j).iter().copied().collect(), metric))
        .collect();
    DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| columns[j][i])
}

/// Correlate every column of `a` with every column of `b`.
///
/// Both matrices must have the same number of rows, in the same feature order.
/// Cell (i, j) of the result is the correlation of column i of `a` with
/// column j of `b`.
pub fn correlation_matrix(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    metric: SimilarityMetric,
) -> Result<DMatrix<f64>> {
    if a.nrows() != b.nrows() {
        return Err(ConnectivityError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }
    if a.nrows() == 0 {
        return Err(ConnectivityError::EmptyData(
            "Cannot correlate profiles with no features".to_string(),
        ));
    }

    let za = standardize_columns(a, metric);
    let zb = standardize_columns(b, metric);

    let mut sim = za.transpose() * zb;
    // Rounding can push perfectly correlated columns just past ±1.
    sim.apply(|x| {
        if x.is_finite() {
            *x = x.clamp(-1.0, 1.0);
        }
    });
    Ok(sim)
}

/// Put `b`'s features in `a`'s order, failing unless both hold the same set.
fn align_features<'a>(a: &AnnotatedMatrix, b: &'a AnnotatedMatrix) -> Result<Cow<'a, AnnotatedMatrix>> {
    if a.row_ids() == b.row_ids() {
        return Ok(Cow::Borrowed(b));
    }

    let a_ids: HashSet<&str> = a.row_ids().iter().map(String::as_str).collect();
    let b_ids: HashSet<&str> = b.row_ids().iter().map(String::as_str).collect();
    let mut only_a: Vec<&str> = a_ids.difference(&b_ids).copied().collect();
    let mut only_b: Vec<&str> = b_ids.difference(&a_ids).copied().collect();

    if !only_a.is_empty() || !only_b.is_empty() {
        only_a.sort_unstable();
        only_b.sort_unstable();
        return Err(ConnectivityError::FeatureMismatch(format!(
            "{} features only in first matrix {:?}, {} only in second {:?}",
            only_a.len(),
            only_a.iter().take(5).collect::<Vec<_>>(),
            only_b.len(),
            only_b.iter().take(5).collect::<Vec<_>>()
        )));
    }

    Ok(Cow::Owned(b.reorder_rows(a.row_ids())?))
}

/// Compute the similarity between the samples of two profile matrices.
///
/// Rows of the result are `a`'s samples (with `a`'s column metadata), columns
/// are `b`'s samples (with `b`'s column metadata). Features are matched by
/// identifier; differing feature sets fail with
/// [`ConnectivityError::FeatureMismatch`].
pub fn compute_similarity(
    a: &AnnotatedMatrix,
    b: &AnnotatedMatrix,
    metric: SimilarityMetric,
) -> Result<AnnotatedMatrix> {
    let b = align_features(a, b)?;

    tracing::debug!(
        metric = metric.name(),
        features = a.n_rows(),
        rows = a.n_cols(),
        cols = b.n_cols(),
        "computing similarity"
    );

    let data = correlation_matrix(a.data(), b.data(), metric)?;
    AnnotatedMatrix::new(
        data,
        a.col_ids().to_vec(),
        b.col_ids().to_vec(),
        a.col_metadata().clone(),
        b.col_metadata().clone(),
    )
}

/// Similarity of a profile matrix against itself, e.g. to build a background.
pub fn compute_self_similarity(
    a: &AnnotatedMatrix,
    metric: SimilarityMetric,
) -> Result<AnnotatedMatrix> {
    compute_similarity(a, a, metric)
}
