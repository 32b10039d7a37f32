//! Drawing foreground and background similarity values from cohort matrices.

use crate::cohort::CohortMatrix;
use crate::symmetry::Comparison;
use std::collections::{HashMap, HashSet};

/// Collect the cells at `rows × cols`, honoring the comparison type.
///
/// For a cross comparison every cell is taken. For a self comparison a cell
/// whose row and column are the same sample is skipped, and when the mirrored
/// cell (b, a) of a cell (a, b) is also inside the selection only the one
/// with the lower row position is kept.
///
/// NaN cells mark undefined similarities and are never part of a distribution.
pub fn select_cells(
    matrix: &CohortMatrix,
    rows: &[usize],
    cols: &[usize],
    comparison: Comparison,
) -> Vec<f64> {
    let mut values = Vec::with_capacity(rows.len() * cols.len());

    match comparison {
        Comparison::CrossComparison => {
            for &i in rows {
                for &j in cols {
                    values.push(matrix.get(i, j));
                }
            }
        }
        Comparison::SelfComparison => {
            let row_pos: HashMap<&str, usize> =
                rows.iter().map(|&i| (matrix.row_id(i), i)).collect();
            let col_ids: HashSet<&str> = cols.iter().map(|&j| matrix.col_id(j)).collect();

            for &i in rows {
                let a = matrix.row_id(i);
                for &j in cols {
                    let b = matrix.col_id(j);
                    if a == b {
                        continue;
                    }
                    if let Some(&mirror_row) = row_pos.get(b) {
                        if col_ids.contains(a) && mirror_row < i {
                            continue;
                        }
                    }
                    values.push(matrix.get(i, j));
                }
            }
        }
    }

    values.retain(|v| !v.is_nan());
    values
}

/// Foreground for one cohort pair: test cells with row key `target` and
/// column key `query`.
pub fn foreground_values(
    test: &CohortMatrix,
    query: &str,
    target: &str,
    comparison: Comparison,
) -> Vec<f64> {
    select_cells(
        test,
        test.row_positions(target),
        test.col_positions(query),
        comparison,
    )
}

/// Where a background distribution was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSource {
    /// Background rows of the target cohort against every column.
    Target,
    /// The whole background; the target has no rows in it.
    Global,
}

/// Background values for one target cohort.
#[derive(Debug, Clone)]
pub struct Background {
    /// Origin of the values.
    pub source: BackgroundSource,
    /// Similarity values, NaN removed.
    pub values: Vec<f64>,
}

/// Background distribution for `target`.
///
/// When the background holds the target cohort, its rows are compared against
/// every background column; otherwise the whole background is the null.
pub fn background_values(
    background: &CohortMatrix,
    target: &str,
    comparison: Comparison,
) -> Background {
    let all_cols: Vec<usize> = (0..background.n_cols()).collect();

    if background.has_row_cohort(target) {
        Background {
            source: BackgroundSource::Target,
            values: select_cells(
                background,
                background.row_positions(target),
                &all_cols,
                comparison,
            ),
        }
    } else {
        let all_rows: Vec<usize> = (0..background.n_rows()).collect();
        Background {
            source: BackgroundSource::Global,
            values: select_cells(background, &all_rows, &all_cols, comparison),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{CohortMatrix, TARGET_FIELD};
    use crate::data::{AnnotatedMatrix, Metadata};
    use nalgebra::DMatrix;

    /// Symmetric 4-sample background with cohorts {X, X, Y, Y}.
    fn background() -> CohortMatrix {
        let ids: Vec<String> = (1..=4).map(|i| format!("s{}", i)).collect();
        let meta = Metadata::from_rows(
            vec!["pert_id".to_string()],
            ids.iter()
                .zip(["X", "X", "Y", "Y"])
                .map(|(id, g)| (id.clone(), vec![g.into()]))
                .collect(),
        )
        .unwrap();
        #[rustfmt::skip]
        let data = DMatrix::from_row_slice(4, 4, &[
            1.0, 0.9, 0.1, 0.2,
            0.9, 1.0, 0.3, 0.4,
            0.1, 0.3, 1.0, 0.8,
            0.2, 0.4, 0.8, 1.0,
        ]);
        let matrix = AnnotatedMatrix::new(data, ids.clone(), ids, meta.clone(), meta)
            .unwrap()
            .to_indexed()
            .unwrap();
        let fields = vec!["pert_id".to_string()];
        CohortMatrix::relabel(&matrix, TARGET_FIELD, &fields, TARGET_FIELD, &fields, ":").unwrap()
    }

    fn block(bg: &CohortMatrix, row: &str, col: &str) -> Vec<f64> {
        select_cells(
            bg,
            bg.row_positions(row),
            bg.col_positions(col),
            Comparison::SelfComparison,
        )
    }

    #[test]
    fn test_block_counts_exclude_diagonal_and_mirrors() {
        let bg = background();
        assert_eq!(block(&bg, "X", "X"), vec![0.9]);
        assert_eq!(block(&bg, "Y", "Y"), vec![0.8]);
        assert_eq!(block(&bg, "X", "Y"), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_cross_comparison_takes_everything() {
        let bg = background();
        let values = select_cells(
            &bg,
            bg.row_positions("X"),
            bg.col_positions("X"),
            Comparison::CrossComparison,
        );
        assert_eq!(values, vec![1.0, 0.9, 0.9, 1.0]);
    }

    #[test]
    fn test_target_background() {
        let bg = background();
        let target = background_values(&bg, "X", Comparison::SelfComparison);
        assert_eq!(target.source, BackgroundSource::Target);
        // X–X once plus the four X–Y pairs.
        assert_eq!(target.values.len(), 5);
    }

    #[test]
    fn test_global_background_is_upper_triangle() {
        let bg = background();
        let global = background_values(&bg, "Z", Comparison::SelfComparison);
        assert_eq!(global.source, BackgroundSource::Global);
        let mut values = global.values;
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![0.1, 0.2, 0.3, 0.4, 0.8, 0.9]);
    }

    #[test]
    fn test_nan_cells_dropped() {
        let ids: Vec<String> = vec!["a".into(), "b".into()];
        let meta = Metadata::from_rows(
            vec!["g".to_string()],
            ids.iter().map(|id| (id.clone(), vec!["G".into()])).collect(),
        )
        .unwrap();
        let data = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, f64::NAN, 1.0]);
        let matrix = AnnotatedMatrix::new(data, ids.clone(), ids, meta.clone(), meta)
            .unwrap()
            .to_indexed()
            .unwrap();
        let fields = vec!["g".to_string()];
        let cohort =
            CohortMatrix::relabel(&matrix, TARGET_FIELD, &fields, TARGET_FIELD, &fields, ":").unwrap();
        let values = background_values(&cohort, "G", Comparison::SelfComparison).values;
        assert!(values.is_empty());
    }
}
