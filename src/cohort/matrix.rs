//! Similarity matrices relabeled and sorted by cohort key.

use crate::cohort::key::{axis_cohort_keys, stable_key_order, CohortFields};
use crate::data::{IndexedMatrix, Metadata, Variable};
use crate::error::Result;
use std::collections::BTreeMap;

/// Level name holding the query cohort key (test matrix columns).
pub const QUERY_FIELD: &str = "query_field";
/// Level name holding the target cohort key (test matrix rows, background axes).
pub const TARGET_FIELD: &str = "target_field";

/// A similarity matrix whose axes are grouped into cohorts.
///
/// Both axes are sorted by key; members of one cohort keep their original
/// relative order.
#[derive(Debug, Clone)]
pub struct CohortMatrix {
    matrix: IndexedMatrix,
    row_key_field: String,
    col_key_field: String,
    row_fields: Vec<String>,
    col_fields: Vec<String>,
    row_keys: Vec<String>,
    col_keys: Vec<String>,
    row_groups: BTreeMap<String, Vec<usize>>,
    col_groups: BTreeMap<String, Vec<usize>>,
}

fn group_positions(keys: &[String]) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, key) in keys.iter().enumerate() {
        groups.entry(key.clone()).or_default().push(idx);
    }
    groups
}

impl CohortMatrix {
    /// Add a key level to each axis and sort both axes by it.
    ///
    /// An existing level named `row_key_field` / `col_key_field` is overwritten.
    pub fn relabel(
        matrix: &IndexedMatrix,
        row_key_field: &str,
        row_fields: &[String],
        col_key_field: &str,
        col_fields: &[String],
        separator: &str,
    ) -> Result<Self> {
        let row_keys = axis_cohort_keys(matrix.rows(), row_fields, separator)?;
        let col_keys = axis_cohort_keys(matrix.cols(), col_fields, separator)?;

        let mut labeled = matrix.clone();
        labeled.set_row_level(
            row_key_field,
            row_keys.iter().map(|k| Variable::from(k.as_str())).collect(),
        )?;
        labeled.set_col_level(
            col_key_field,
            col_keys.iter().map(|k| Variable::from(k.as_str())).collect(),
        )?;

        let row_order = stable_key_order(&row_keys);
        let col_order = stable_key_order(&col_keys);
        let sorted = labeled.permute_rows(&row_order).permute_cols(&col_order);

        let row_keys: Vec<String> = row_order.iter().map(|&i| row_keys[i].clone()).collect();
        let col_keys: Vec<String> = col_order.iter().map(|&i| col_keys[i].clone()).collect();

        Ok(Self {
            matrix: sorted,
            row_key_field: row_key_field.to_string(),
            col_key_field: col_key_field.to_string(),
            row_fields: row_fields.to_vec(),
            col_fields: col_fields.to_vec(),
            row_groups: group_positions(&row_keys),
            col_groups: group_positions(&col_keys),
            row_keys,
            col_keys,
        })
    }

    /// The relabeled, sorted matrix.
    pub fn matrix(&self) -> &IndexedMatrix {
        &self.matrix
    }

    /// Consume into the relabeled matrix.
    pub fn into_matrix(self) -> IndexedMatrix {
        self.matrix
    }

    /// Level name of the row keys.
    pub fn row_key_field(&self) -> &str {
        &self.row_key_field
    }

    /// Level name of the column keys.
    pub fn col_key_field(&self) -> &str {
        &self.col_key_field
    }

    /// Row key at every row position.
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// Column key at every column position.
    pub fn col_keys(&self) -> &[String] {
        &self.col_keys
    }

    /// Distinct row cohorts, sorted.
    pub fn row_cohorts(&self) -> Vec<&str> {
        self.row_groups.keys().map(String::as_str).collect()
    }

    /// Distinct column cohorts, sorted.
    pub fn col_cohorts(&self) -> Vec<&str> {
        self.col_groups.keys().map(String::as_str).collect()
    }

    /// Row positions of one cohort; empty if the cohort is absent.
    pub fn row_positions(&self, key: &str) -> &[usize] {
        self.row_groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Column positions of one cohort; empty if the cohort is absent.
    pub fn col_positions(&self, key: &str) -> &[usize] {
        self.col_groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a cohort appears on the row axis.
    pub fn has_row_cohort(&self, key: &str) -> bool {
        self.row_groups.contains_key(key)
    }

    /// Sample identifier at a row position.
    pub fn row_id(&self, row: usize) -> &str {
        self.matrix.rows().id(row)
    }

    /// Sample identifier at a column position.
    pub fn col_id(&self, col: usize) -> &str {
        self.matrix.cols().id(col)
    }

    /// Value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix.get(row, col)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.matrix.n_rows()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.matrix.n_cols()
    }

    /// One metadata row per row cohort: its constituent field values.
    pub fn row_cohort_metadata(&self) -> Result<Metadata> {
        cohort_metadata(&self.matrix, true, &self.row_groups, &self.row_fields)
    }

    /// One metadata row per column cohort: its constituent field values.
    pub fn col_cohort_metadata(&self) -> Result<Metadata> {
        cohort_metadata(&self.matrix, false, &self.col_groups, &self.col_fields)
    }
}

/// Keys never contain a separator inside a field value, so members of one
/// cohort share every rendered field value and the first member stands in.
fn cohort_metadata(
    matrix: &IndexedMatrix,
    rows: bool,
    groups: &BTreeMap<String, Vec<usize>>,
    fields: &[String],
) -> Result<Metadata> {
    let axis = if rows { matrix.rows() } else { matrix.cols() };
    let positions = fields
        .iter()
        .map(|f| axis.field_position(f))
        .collect::<Result<Vec<_>>>()?;

    let records = groups
        .iter()
        .map(|(key, members)| {
            let first = &axis.labels()[members[0]];
            let values = positions.iter().map(|&p| first.values[p].clone()).collect();
            (key.clone(), values)
        })
        .collect();
    Metadata::from_rows(fields.to_vec(), records)
}

/// Relabel the test and background similarity matrices by cohort.
///
/// Test rows are keyed by the target fields and test columns by the query
/// fields. The background is a self-similarity matrix, so both of its axes are
/// keyed by the background fields under the target key name.
pub fn prepare_cohort_matrices(
    test: &IndexedMatrix,
    background: &IndexedMatrix,
    fields: &CohortFields,
) -> Result<(CohortMatrix, CohortMatrix)> {
    fields.validate()?;

    let test = CohortMatrix::relabel(
        test,
        TARGET_FIELD,
        &fields.target_fields,
        QUERY_FIELD,
        &fields.query_fields,
        &fields.separator,
    )?;
    let background = CohortMatrix::relabel(
        background,
        TARGET_FIELD,
        &fields.background_fields,
        TARGET_FIELD,
        &fields.background_fields,
        &fields.separator,
    )?;

    tracing::debug!(
        test_targets = test.row_cohorts().len(),
        test_queries = test.col_cohorts().len(),
        background_cohorts = background.row_cohorts().len(),
        "relabeled matrices by cohort"
    );

    Ok((test, background))
}
