//! Self-comparison detection and the resulting sampling policy.
//!
//! A matrix whose row cohorts and column cohorts are the same set compares a
//! cohort set against itself. Its diagonal holds self-similarities and each
//! off-diagonal pair appears twice, so both must be filtered out before the
//! values are used as a distribution. A cross comparison has no such
//! redundancy.

use crate::cohort::CohortMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the cells of a similarity matrix relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Row and column cohorts are the same set.
    SelfComparison,
    /// Row and column cohorts differ.
    CrossComparison,
}

impl Comparison {
    /// Whether this is a self comparison.
    pub fn is_self(&self) -> bool {
        matches!(self, Self::SelfComparison)
    }
}

/// Classify a relabeled matrix by comparing its row and column key sets.
pub fn detect_comparison(matrix: &CohortMatrix) -> Comparison {
    let rows: BTreeSet<&str> = matrix.row_keys().iter().map(String::as_str).collect();
    let cols: BTreeSet<&str> = matrix.col_keys().iter().map(String::as_str).collect();
    if rows == cols {
        Comparison::SelfComparison
    } else {
        Comparison::CrossComparison
    }
}

/// Classify the test and background matrices independently.
pub fn check_symmetry(test: &CohortMatrix, background: &CohortMatrix) -> (Comparison, Comparison) {
    (detect_comparison(test), detect_comparison(background))
}

/// How foreground and background values are drawn for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    /// Treatment of the test matrix cells forming each foreground.
    pub foreground: Comparison,
    /// Treatment of the background matrix cells.
    pub background: Comparison,
}

impl SamplingPolicy {
    /// Resolve the policy for a (test, background) pair of comparisons.
    ///
    /// | test  | background | foreground cells            | background cells                    |
    /// |-------|------------|-----------------------------|-------------------------------------|
    /// | self  | self       | no self pairs, no mirrors   | target rows, no self pairs/mirrors  |
    /// | cross | self       | whole cohort block          | target rows, no self pairs/mirrors  |
    /// | self  | cross      | no self pairs, no mirrors   | target rows, every cell             |
    /// | cross | cross      | whole cohort block          | target rows, every cell             |
    ///
    /// A target missing from the background falls back to the whole
    /// background under the same cell rule.
    pub fn resolve(test: Comparison, background: Comparison) -> Self {
        use Comparison::{CrossComparison, SelfComparison};
        let (foreground, background) = match (test, background) {
            (SelfComparison, SelfComparison) => (SelfComparison, SelfComparison),
            (CrossComparison, SelfComparison) => (CrossComparison, SelfComparison),
            (SelfComparison, CrossComparison) => (SelfComparison, CrossComparison),
            (CrossComparison, CrossComparison) => (CrossComparison, CrossComparison),
        };
        Self {
            foreground,
            background,
        }
    }

    /// Detect both comparisons and resolve the policy.
    pub fn detect(test: &CohortMatrix, background: &CohortMatrix) -> Self {
        let (test, background) = check_symmetry(test, background);
        Self::resolve(test, background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{QUERY_FIELD, TARGET_FIELD};
    use crate::data::{AnnotatedMatrix, Metadata};
    use nalgebra::DMatrix;

    fn cohort_matrix(row_groups: &[&str], col_groups: &[&str]) -> CohortMatrix {
        let meta = |prefix: &str, groups: &[&str]| {
            Metadata::from_rows(
                vec!["group".to_string()],
                groups
                    .iter()
                    .enumerate()
                    .map(|(i, g)| (format!("{}{}", prefix, i), vec![(*g).into()]))
                    .collect(),
            )
            .unwrap()
        };
        let row_meta = meta("r", row_groups);
        let col_meta = meta("c", col_groups);
        let matrix = AnnotatedMatrix::new(
            DMatrix::zeros(row_groups.len(), col_groups.len()),
            row_meta.ids().to_vec(),
            col_meta.ids().to_vec(),
            row_meta,
            col_meta,
        )
        .unwrap()
        .to_indexed()
        .unwrap();
        let fields = vec!["group".to_string()];
        CohortMatrix::relabel(&matrix, TARGET_FIELD, &fields, QUERY_FIELD, &fields, ":").unwrap()
    }

    #[test]
    fn test_same_key_sets_is_self() {
        let m = cohort_matrix(&["X", "Y", "X"], &["Y", "X"]);
        assert_eq!(detect_comparison(&m), Comparison::SelfComparison);
    }

    #[test]
    fn test_key_on_one_axis_only_is_cross() {
        let m = cohort_matrix(&["X", "Y"], &["X", "Y", "Z"]);
        assert_eq!(detect_comparison(&m), Comparison::CrossComparison);
        let m = cohort_matrix(&["X", "Z"], &["X"]);
        assert_eq!(detect_comparison(&m), Comparison::CrossComparison);
    }

    #[test]
    fn test_check_symmetry_is_independent() {
        let test = cohort_matrix(&["X"], &["Y"]);
        let bg = cohort_matrix(&["X", "Y"], &["Y", "X"]);
        assert_eq!(
            check_symmetry(&test, &bg),
            (Comparison::CrossComparison, Comparison::SelfComparison)
        );
    }

    #[test]
    fn test_policy_table_covers_all_combinations() {
        use Comparison::*;
        for test in [SelfComparison, CrossComparison] {
            for bg in [SelfComparison, CrossComparison] {
                let policy = SamplingPolicy::resolve(test, bg);
                assert_eq!(policy.foreground, test);
                assert_eq!(policy.background, bg);
            }
        }
    }
}
