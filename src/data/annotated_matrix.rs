//! Dense numeric matrix annotated with row and column metadata.

use crate::data::Metadata;
use crate::error::{ConnectivityError, Result};
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};

/// A dense matrix with identifiers and metadata on both axes.
///
/// Profile matrices are features × samples; similarity matrices are
/// samples × samples. Metadata is aligned to the axis identifiers when the
/// matrix is built, so its row order always matches the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedMatrix {
    /// Dense values (rows × columns).
    data: DMatrix<f64>,
    /// Row identifiers.
    row_ids: Vec<String>,
    /// Column identifiers.
    col_ids: Vec<String>,
    /// Metadata for each row identifier.
    row_metadata: Metadata,
    /// Metadata for each column identifier.
    col_metadata: Metadata,
}

impl AnnotatedMatrix {
    /// Create a new matrix, aligning both metadata tables to the identifiers.
    pub fn new(
        data: DMatrix<f64>,
        row_ids: Vec<String>,
        col_ids: Vec<String>,
        row_metadata: Metadata,
        col_metadata: Metadata,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != row_ids.len() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: nrows,
                actual: row_ids.len(),
            });
        }
        if ncols != col_ids.len() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: ncols,
                actual: col_ids.len(),
            });
        }
        check_unique(&row_ids, "row")?;
        check_unique(&col_ids, "column")?;

        let row_metadata = row_metadata.align_to(&row_ids)?;
        let col_metadata = col_metadata.align_to(&col_ids)?;

        Ok(Self {
            data,
            row_ids,
            col_ids,
            row_metadata,
            col_metadata,
        })
    }

    /// Create a matrix whose metadata tables hold identifiers only.
    pub fn without_metadata(
        data: DMatrix<f64>,
        row_ids: Vec<String>,
        col_ids: Vec<String>,
    ) -> Result<Self> {
        let row_metadata = Metadata::from_ids(row_ids.clone())?;
        let col_metadata = Metadata::from_ids(col_ids.clone())?;
        Self::new(data, row_ids, col_ids, row_metadata, col_metadata)
    }

    /// Get the value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Row identifiers.
    #[inline]
    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    /// Column identifiers.
    #[inline]
    pub fn col_ids(&self) -> &[String] {
        &self.col_ids
    }

    /// Row metadata, aligned to `row_ids`.
    #[inline]
    pub fn row_metadata(&self) -> &Metadata {
        &self.row_metadata
    }

    /// Column metadata, aligned to `col_ids`.
    #[inline]
    pub fn col_metadata(&self) -> &Metadata {
        &self.col_metadata
    }

    /// Mutable row metadata. Identifiers cannot be changed through this.
    pub fn row_metadata_mut(&mut self) -> &mut Metadata {
        &mut self.row_metadata
    }

    /// Mutable column metadata. Identifiers cannot be changed through this.
    pub fn col_metadata_mut(&mut self) -> &mut Metadata {
        &mut self.col_metadata
    }

    /// Get the underlying dense matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Get a column as a dense vector.
    pub fn col(&self, col: usize) -> Vec<f64> {
        self.data.column(col).iter().copied().collect()
    }

    /// Position of a row identifier.
    pub fn row_position(&self, id: &str) -> Option<usize> {
        self.row_ids.iter().position(|r| r == id)
    }

    /// Reorder rows to follow `order`, which must be a permutation of the row ids.
    pub fn reorder_rows(&self, order: &[String]) -> Result<Self> {
        if order.len() != self.n_rows() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: self.n_rows(),
                actual: order.len(),
            });
        }
        let positions: HashMap<&str, usize> = self
            .row_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut indices = Vec::with_capacity(order.len());
        for id in order {
            let idx = positions.get(id.as_str()).ok_or_else(|| {
                ConnectivityError::SampleMismatch(format!("Row '{}' not found", id))
            })?;
            indices.push(*idx);
        }

        let data = self.data.select_rows(indices.iter());
        Self::new(
            data,
            order.to_vec(),
            self.col_ids.clone(),
            self.row_metadata.clone(),
            self.col_metadata.clone(),
        )
    }
}

fn check_unique(ids: &[String], axis: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ConnectivityError::SampleMismatch(format!(
                "Duplicate {} identifier '{}'",
                axis, id
            )));
        }
    }
    Ok(())
}
