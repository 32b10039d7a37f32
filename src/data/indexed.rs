//! Flattened multi-level view of an annotated matrix.
//!
//! Each axis position carries its identifier plus one value per metadata
//! field, so grouping code can read and add levels without going back to the
//! separate metadata tables. Converting back with
//! [`IndexedMatrix::to_annotated`] recovers the original structure exactly.

use crate::data::{AnnotatedMatrix, Metadata, Variable};
use crate::error::{ConnectivityError, Result};
use nalgebra::DMatrix;

/// Identifier and level values for one axis position.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    /// Sample or feature identifier.
    pub id: String,
    /// One value per field of the owning axis, in field order.
    pub values: Vec<Variable>,
}

/// One axis of an [`IndexedMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedAxis {
    fields: Vec<String>,
    labels: Vec<AxisLabel>,
}

impl IndexedAxis {
    /// Build an axis for `ids`, looking every row up in `metadata` by identifier.
    pub fn from_metadata(ids: &[String], metadata: &Metadata) -> Result<Self> {
        let labels = ids
            .iter()
            .map(|id| {
                Ok(AxisLabel {
                    id: id.clone(),
                    values: metadata.row(id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            fields: metadata.column_names().to_vec(),
            labels,
        })
    }

    /// Number of positions on this axis.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if the axis is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Field (level) names.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// All labels in axis order.
    pub fn labels(&self) -> &[AxisLabel] {
        &self.labels
    }

    /// Identifier at a position.
    pub fn id(&self, index: usize) -> &str {
        &self.labels[index].id
    }

    /// Identifiers in axis order.
    pub fn ids(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.id.clone()).collect()
    }

    /// Position of a field among the levels.
    pub fn field_position(&self, field: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| ConnectivityError::MissingField(field.to_string()))
    }

    /// Values of one level, in axis order.
    pub fn level(&self, field: &str) -> Result<Vec<&Variable>> {
        let pos = self.field_position(field)?;
        Ok(self.labels.iter().map(|l| &l.values[pos]).collect())
    }

    /// Add a level, or overwrite it if the field already exists.
    pub fn set_level(&mut self, field: &str, values: Vec<Variable>) -> Result<()> {
        if values.len() != self.len() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: self.len(),
                actual: values.len(),
            });
        }
        match self.field_position(field) {
            Ok(pos) => {
                for (label, value) in self.labels.iter_mut().zip(values) {
                    label.values[pos] = value;
                }
            }
            Err(_) => {
                self.fields.push(field.to_string());
                for (label, value) in self.labels.iter_mut().zip(values) {
                    label.values.push(value);
                }
            }
        }
        Ok(())
    }

    /// Rebuild the metadata table for this axis.
    pub fn to_metadata(&self) -> Result<Metadata> {
        Metadata::from_rows(
            self.fields.clone(),
            self.labels
                .iter()
                .map(|l| (l.id.clone(), l.values.clone()))
                .collect(),
        )
    }

    fn permuted(&self, order: &[usize]) -> Self {
        Self {
            fields: self.fields.clone(),
            labels: order.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }
}

/// A matrix whose axes carry their metadata inline.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedMatrix {
    data: DMatrix<f64>,
    rows: IndexedAxis,
    cols: IndexedAxis,
}

impl IndexedMatrix {
    /// Create from data and two axes of matching length.
    pub fn new(data: DMatrix<f64>, rows: IndexedAxis, cols: IndexedAxis) -> Result<Self> {
        if data.nrows() != rows.len() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: data.nrows(),
                actual: rows.len(),
            });
        }
        if data.ncols() != cols.len() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: data.ncols(),
                actual: cols.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Flatten an annotated matrix.
    pub fn from_annotated(matrix: &AnnotatedMatrix) -> Result<Self> {
        let rows = IndexedAxis::from_metadata(matrix.row_ids(), matrix.row_metadata())?;
        let cols = IndexedAxis::from_metadata(matrix.col_ids(), matrix.col_metadata())?;
        Self::new(matrix.data().clone(), rows, cols)
    }

    /// Split back into data plus row and column metadata.
    pub fn to_annotated(&self) -> Result<AnnotatedMatrix> {
        AnnotatedMatrix::new(
            self.data.clone(),
            self.rows.ids(),
            self.cols.ids(),
            self.rows.to_metadata()?,
            self.cols.to_metadata()?,
        )
    }

    /// Get the value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// The dense values.
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Row axis.
    pub fn rows(&self) -> &IndexedAxis {
        &self.rows
    }

    /// Column axis.
    pub fn cols(&self) -> &IndexedAxis {
        &self.cols
    }

    /// Add or overwrite a row level.
    pub fn set_row_level(&mut self, field: &str, values: Vec<Variable>) -> Result<()> {
        self.rows.set_level(field, values)
    }

    /// Add or overwrite a column level.
    pub fn set_col_level(&mut self, field: &str, values: Vec<Variable>) -> Result<()> {
        self.cols.set_level(field, values)
    }

    /// Reorder rows; `order[k]` is the old position placed at `k`.
    pub fn permute_rows(&self, order: &[usize]) -> Self {
        Self {
            data: self.data.select_rows(order.iter()),
            rows: self.rows.permuted(order),
            cols: self.cols.clone(),
        }
    }

    /// Reorder columns; `order[k]` is the old position placed at `k`.
    pub fn permute_cols(&self, order: &[usize]) -> Self {
        Self {
            data: self.data.select_columns(order.iter()),
            rows: self.rows.clone(),
            cols: self.cols.permuted(order),
        }
    }
}

impl AnnotatedMatrix {
    /// Flattened multi-level view of this matrix.
    pub fn to_indexed(&self) -> Result<IndexedMatrix> {
        IndexedMatrix::from_annotated(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_similarity() -> AnnotatedMatrix {
        let data = DMatrix::from_row_slice(2, 3, &[0.1, 0.2, 0.3, -0.4, f64::NAN, 0.6]);
        let row_ids: Vec<String> = vec!["r1".into(), "r2".into()];
        let col_ids: Vec<String> = vec!["c1".into(), "c2".into(), "c3".into()];
        let row_meta = Metadata::from_rows(
            vec!["pert_id".to_string(), "pert_time".to_string()],
            vec![
                ("r1".to_string(), vec!["A".into(), 6i64.into()]),
                ("r2".to_string(), vec!["B".into(), Variable::Missing]),
            ],
        )
        .unwrap();
        let col_meta = Metadata::from_rows(
            vec!["cell_id".to_string()],
            vec![
                ("c3".to_string(), vec!["PC3".into()]),
                ("c1".to_string(), vec!["A375".into()]),
                ("c2".to_string(), vec![0.5.into()]),
            ],
        )
        .unwrap();
        AnnotatedMatrix::new(data, row_ids, col_ids, row_meta, col_meta).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let original = create_similarity();
        let indexed = original.to_indexed().unwrap();
        let restored = indexed.to_annotated().unwrap();

        assert_eq!(restored.row_ids(), original.row_ids());
        assert_eq!(restored.col_ids(), original.col_ids());
        assert_eq!(restored.row_metadata(), original.row_metadata());
        assert_eq!(restored.col_metadata(), original.col_metadata());
        for i in 0..original.n_rows() {
            for j in 0..original.n_cols() {
                let (a, b) = (original.get(i, j), restored.get(i, j));
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
    }

    #[test]
    fn test_level_lookup() {
        let indexed = create_similarity().to_indexed().unwrap();
        let cells: Vec<String> = indexed
            .cols()
            .level("cell_id")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(cells, vec!["A375", "0.5", "PC3"]);
        assert!(matches!(
            indexed.rows().level("cell_id"),
            Err(ConnectivityError::MissingField(_))
        ));
    }

    #[test]
    fn test_set_level_adds_then_overwrites() {
        let mut indexed = create_similarity().to_indexed().unwrap();
        indexed
            .set_row_level("target_field", vec!["x".into(), "y".into()])
            .unwrap();
        assert_eq!(indexed.rows().fields().len(), 3);
        indexed
            .set_row_level("target_field", vec!["z".into(), "w".into()])
            .unwrap();
        assert_eq!(indexed.rows().fields().len(), 3);
        assert_eq!(
            indexed.rows().level("target_field").unwrap()[1].as_categorical(),
            Some("w")
        );
        assert!(indexed.set_row_level("bad", vec!["only_one".into()]).is_err());
    }

    #[test]
    fn test_permute_moves_data_with_labels() {
        let indexed = create_similarity().to_indexed().unwrap();
        let permuted = indexed.permute_cols(&[2, 0, 1]);
        assert_eq!(permuted.cols().ids(), vec!["c3", "c1", "c2"]);
        assert_eq!(permuted.get(0, 0), 0.3);
        assert_eq!(permuted.get(1, 0), 0.6);

        let permuted = indexed.permute_rows(&[1, 0]);
        assert_eq!(permuted.rows().id(0), "r2");
        assert_eq!(permuted.get(0, 0), -0.4);
    }
}
