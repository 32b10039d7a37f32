//! Connectivity of every (query cohort, target cohort) pair.

use crate::cohort::CohortMatrix;
use crate::connectivity::ks::ks_test;
use crate::connectivity::percentile::percentile_score;
use crate::connectivity::sampling::{background_values, foreground_values, BackgroundSource};
use crate::data::{AnnotatedMatrix, Metadata};
use crate::error::{ConnectivityError, Result};
use crate::symmetry::SamplingPolicy;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::fmt;
use std::str::FromStr;

/// Statistic comparing a foreground distribution to its background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityMetric {
    /// Two-sample Kolmogorov-Smirnov statistic.
    #[default]
    KsTest,
    /// Percentile rank of the foreground mean within the background.
    PercentileScore,
}

impl ConnectivityMetric {
    /// Get the name used in configuration and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Self::KsTest => "ks_test",
            Self::PercentileScore => "percentile_score",
        }
    }

    /// Score one foreground against one background.
    pub fn score(&self, foreground: &[f64], background: &[f64]) -> Result<PairScore> {
        match self {
            Self::KsTest => ks_test(foreground, background),
            Self::PercentileScore => percentile_score(foreground, background),
        }
    }
}

impl fmt::Display for ConnectivityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConnectivityMetric {
    type Err = ConnectivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ks_test" => Ok(Self::KsTest),
            "percentile_score" => Ok(Self::PercentileScore),
            other => Err(ConnectivityError::UnknownMetric {
                kind: "connectivity",
                name: other.to_string(),
            }),
        }
    }
}

/// Unsigned and signed connectivity of one cohort pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub unsigned: f64,
    pub signed: f64,
}

impl PairScore {
    /// Placeholder for a pair whose connectivity is undefined.
    pub fn missing() -> Self {
        Self {
            unsigned: f64::NAN,
            signed: f64::NAN,
        }
    }

    /// Score of size `magnitude` carrying the [`direction`] of the pair.
    pub fn directed(magnitude: f64, foreground: &[f64], background: &[f64]) -> Self {
        Self {
            unsigned: magnitude,
            signed: direction(foreground, background) * magnitude,
        }
    }
}

/// Sign of `mean(foreground) - median(background)`: 1, -1, or 0 on an exact tie.
///
/// Both inputs must be non-empty.
pub fn direction(foreground: &[f64], background: &[f64]) -> f64 {
    let diff = foreground.iter().mean() - Data::new(background.to_vec()).median();
    if diff > 0.0 {
        1.0
    } else if diff < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Connectivity scores with target cohorts as rows and query cohorts as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityMatrix {
    metric: ConnectivityMetric,
    targets: Vec<String>,
    queries: Vec<String>,
    data: DMatrix<f64>,
}

impl ConnectivityMatrix {
    /// Metric the scores were computed with.
    pub fn metric(&self) -> ConnectivityMetric {
        self.metric
    }

    /// Target cohorts (rows), sorted.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Query cohorts (columns), sorted.
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// The score matrix; NaN marks an undefined pair.
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Score for one pair, `None` if either cohort is unknown.
    pub fn get(&self, target: &str, query: &str) -> Option<f64> {
        let row = self.targets.iter().position(|t| t == target)?;
        let col = self.queries.iter().position(|q| q == query)?;
        Some(self.data[(row, col)])
    }

    /// Attach cohort metadata and export as an annotated matrix.
    ///
    /// `target_metadata` and `query_metadata` are keyed by cohort key.
    pub fn to_annotated(
        &self,
        target_metadata: &Metadata,
        query_metadata: &Metadata,
    ) -> Result<AnnotatedMatrix> {
        AnnotatedMatrix::new(
            self.data.clone(),
            self.targets.clone(),
            self.queries.clone(),
            target_metadata.clone(),
            query_metadata.clone(),
        )
    }
}

/// Output of [`compute_connectivities`].
#[derive(Debug, Clone)]
pub struct ConnectivityResult {
    /// Unsigned scores.
    pub unsigned: ConnectivityMatrix,
    /// Signed scores.
    pub signed: ConnectivityMatrix,
    /// Sampling policy the scores were computed under.
    pub policy: SamplingPolicy,
}

/// Score every (query, target) cohort pair of the test matrix.
///
/// Targets are the test matrix's row cohorts and queries its column cohorts.
/// The background for a target is drawn once and reused for all queries. A
/// pair with an empty foreground or background gets NaN in both matrices;
/// the run carries on.
///
/// Targets are scored in parallel. Every cell depends only on read-only
/// inputs, so the result matches a sequential evaluation exactly.
pub fn compute_connectivities(
    test: &CohortMatrix,
    background: &CohortMatrix,
    policy: SamplingPolicy,
    metric: ConnectivityMetric,
) -> ConnectivityResult {
    let targets = test.row_cohorts();
    let queries = test.col_cohorts();

    tracing::debug!(
        metric = metric.name(),
        targets = targets.len(),
        queries = queries.len(),
        ?policy,
        "computing connectivities"
    );

    let scores: Vec<Vec<PairScore>> = targets
        .par_iter()
        .map(|&target| {
            let bg = background_values(background, target, policy.background);
            if bg.source == BackgroundSource::Global {
                tracing::warn!(
                    cohort = target,
                    "target cohort absent from background; using the whole background"
                );
            }

            queries
                .iter()
                .map(|&query| {
                    let fg = foreground_values(test, query, target, policy.foreground);
                    match metric.score(&fg, &bg.values) {
                        Ok(score) => score,
                        Err(err) => {
                            tracing::warn!(
                                target_cohort = target,
                                query_cohort = query,
                                error = %err,
                                "connectivity undefined"
                            );
                            PairScore::missing()
                        }
                    }
                })
                .collect()
        })
        .collect();

    let build = |pick: fn(&PairScore) -> f64| ConnectivityMatrix {
        metric,
        targets: targets.iter().map(|t| t.to_string()).collect(),
        queries: queries.iter().map(|q| q.to_string()).collect(),
        data: DMatrix::from_fn(targets.len(), queries.len(), |i, j| pick(&scores[i][j])),
    };

    ConnectivityResult {
        unsigned: build(|s| s.unsigned),
        signed: build(|s| s.signed),
        policy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{CohortMatrix, QUERY_FIELD, TARGET_FIELD};
    use crate::data::{IndexedMatrix, Metadata};
    use crate::symmetry::Comparison;

    fn metadata(prefix: &str, groups: &[&str]) -> Metadata {
        Metadata::from_rows(
            vec!["pert_id".to_string()],
            groups
                .iter()
                .enumerate()
                .map(|(i, g)| (format!("{}{}", prefix, i), vec![(*g).into()]))
                .collect(),
        )
        .unwrap()
    }

    fn indexed(data: DMatrix<f64>, rows: &Metadata, cols: &Metadata) -> IndexedMatrix {
        AnnotatedMatrix::new(
            data,
            rows.ids().to_vec(),
            cols.ids().to_vec(),
            rows.clone(),
            cols.clone(),
        )
        .unwrap()
        .to_indexed()
        .unwrap()
    }

    fn relabel(matrix: &IndexedMatrix, col_field: &str) -> CohortMatrix {
        let fields = vec!["pert_id".to_string()];
        CohortMatrix::relabel(matrix, TARGET_FIELD, &fields, col_field, &fields, ":").unwrap()
    }

    fn background() -> CohortMatrix {
        let meta = metadata("bg", &["T1", "T1", "T2", "T2"]);
        #[rustfmt::skip]
        let data = DMatrix::from_row_slice(4, 4, &[
            1.0, 0.1, 0.0, -0.1,
            0.1, 1.0, 0.2, 0.05,
            0.0, 0.2, 1.0, -0.2,
            -0.1, 0.05, -0.2, 1.0,
        ]);
        relabel(&indexed(data, &meta, &meta), TARGET_FIELD)
    }

    /// Targets T1/T2 as rows, queries Qa/Qb as columns.
    fn test_matrix() -> CohortMatrix {
        let rows = metadata("int", &["T1", "T1", "T2"]);
        let cols = metadata("ext", &["Qa", "Qa", "Qb"]);
        #[rustfmt::skip]
        let data = DMatrix::from_row_slice(3, 3, &[
            0.9, 0.8, -0.5,
            0.7, 0.95, -0.6,
            -0.4, -0.3, 0.01,
        ]);
        relabel(&indexed(data, &rows, &cols), QUERY_FIELD)
    }

    fn cross_policy() -> SamplingPolicy {
        SamplingPolicy::resolve(Comparison::CrossComparison, Comparison::SelfComparison)
    }

    #[test]
    fn test_ks_directions() {
        let result =
            compute_connectivities(&test_matrix(), &background(), cross_policy(), ConnectivityMetric::KsTest);

        assert_eq!(result.signed.targets(), &["T1", "T2"]);
        assert_eq!(result.signed.queries(), &["Qa", "Qb"]);
        // T1 × Qa similarities all exceed the T1 background.
        assert!(result.signed.get("T1", "Qa").unwrap() > 0.0);
        assert!(result.signed.get("T1", "Qb").unwrap() < 0.0);
        assert_eq!(
            result.unsigned.get("T1", "Qa").unwrap(),
            result.signed.get("T1", "Qa").unwrap().abs()
        );
    }

    #[test]
    fn test_percentile_range() {
        let result = compute_connectivities(
            &test_matrix(),
            &background(),
            cross_policy(),
            ConnectivityMetric::PercentileScore,
        );
        for value in result.signed.data().iter() {
            assert!((-100.0..=100.0).contains(value));
        }
        assert_eq!(result.signed.get("T1", "Qa"), Some(100.0));
        assert_eq!(result.unsigned.get("T1", "Qa"), Some(100.0));
    }

    #[test]
    fn test_empty_foreground_is_nan_not_error() {
        // A self comparison with a single-member cohort has no foreground.
        let meta = metadata("s", &["A", "B", "B"]);
        #[rustfmt::skip]
        let data = DMatrix::from_row_slice(3, 3, &[
            1.0, 0.2, 0.3,
            0.2, 1.0, 0.6,
            0.3, 0.6, 1.0,
        ]);
        let test = relabel(&indexed(data, &meta, &meta), QUERY_FIELD);
        let policy = SamplingPolicy::resolve(Comparison::SelfComparison, Comparison::SelfComparison);
        let result = compute_connectivities(&test, &background(), policy, ConnectivityMetric::KsTest);

        assert!(result.signed.get("A", "A").unwrap().is_nan());
        assert!(result.unsigned.get("A", "A").unwrap().is_nan());
        assert!(!result.signed.get("B", "B").unwrap().is_nan());
        assert!(!result.signed.get("A", "B").unwrap().is_nan());
    }

    #[test]
    fn test_unknown_cohort_lookup() {
        let result =
            compute_connectivities(&test_matrix(), &background(), cross_policy(), ConnectivityMetric::KsTest);
        assert_eq!(result.signed.get("T9", "Qa"), None);
        assert_eq!(result.signed.metric(), ConnectivityMetric::KsTest);
    }

    #[test]
    fn test_direction() {
        let bg = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(direction(&[2.6], &bg), 1.0);
        assert_eq!(direction(&[2.0, 3.0], &bg), 0.0);
        assert_eq!(direction(&[0.0], &bg), -1.0);

        let score = PairScore::directed(0.5, &[2.5], &bg);
        assert_eq!(score.unsigned, 0.5);
        assert_eq!(score.signed, 0.0);
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!(
            "percentile_score".parse::<ConnectivityMetric>().unwrap(),
            ConnectivityMetric::PercentileScore
        );
        assert!(matches!(
            "wtcs".parse::<ConnectivityMetric>(),
            Err(ConnectivityError::UnknownMetric { kind: "connectivity", .. })
        ));
    }
}
