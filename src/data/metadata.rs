//! Per-sample (or per-feature) attribute tables.

use crate::error::{ConnectivityError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A metadata value that can be categorical, continuous, or ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Ordinal variable with integer rank.
    Ordinal(i64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as ordinal i64.
    pub fn as_ordinal(&self) -> Option<i64> {
        match self {
            Variable::Ordinal(v) => Some(*v),
            _ => None,
        }
    }
}

/// Missing values render as `NA` so that they still produce a stable cohort key.
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Categorical(s) => write!(f, "{}", s),
            Variable::Continuous(v) => write!(f, "{}", v),
            Variable::Ordinal(v) => write!(f, "{}", v),
            Variable::Missing => write!(f, "NA"),
        }
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Variable::Categorical(value.to_string())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Variable::Categorical(value)
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Variable::Continuous(value)
    }
}

impl From<i64> for Variable {
    fn from(value: i64) -> Self {
        Variable::Ordinal(value)
    }
}

/// Attribute table with one row per identifier.
///
/// Values are stored by identifier, so callers never depend on row position:
/// [`Metadata::align_to`] reorders the table to whatever axis it annotates.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Row identifiers in order.
    ids: Vec<String>,
    /// Column names in order.
    column_names: Vec<String>,
    /// Data stored as id -> column_name -> Variable.
    data: HashMap<String, HashMap<String, Variable>>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            column_names: Vec::new(),
            data: HashMap::new(),
        }
    }

    /// Create metadata with identifiers but no columns.
    pub fn from_ids(ids: Vec<String>) -> Result<Self> {
        Self::from_rows(
            Vec::new(),
            ids.into_iter().map(|id| (id, Vec::new())).collect(),
        )
    }

    /// Build metadata from `(id, values)` rows, values ordered as `column_names`.
    ///
    /// Fails on duplicate identifiers, duplicate column names, or a row whose
    /// length differs from the number of columns.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<(String, Vec<Variable>)>) -> Result<Self> {
        let mut seen_columns = HashSet::new();
        for name in &column_names {
            if !seen_columns.insert(name.as_str()) {
                return Err(ConnectivityError::InvalidParameter(format!(
                    "Duplicate metadata column '{}'",
                    name
                )));
            }
        }

        let mut ids = Vec::with_capacity(rows.len());
        let mut data = HashMap::with_capacity(rows.len());

        for (id, values) in rows {
            if values.len() != column_names.len() {
                return Err(ConnectivityError::DimensionMismatch {
                    expected: column_names.len(),
                    actual: values.len(),
                });
            }
            if data.contains_key(&id) {
                return Err(ConnectivityError::SampleMismatch(format!(
                    "Duplicate identifier '{}'",
                    id
                )));
            }
            let row: HashMap<String, Variable> =
                column_names.iter().cloned().zip(values).collect();
            ids.push(id.clone());
            data.insert(id, row);
        }

        Ok(Self {
            ids,
            column_names,
            data,
        })
    }

    /// Row identifiers in order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of rows (identifiers).
    pub fn n_rows(&self) -> usize {
        self.ids.len()
    }

    /// Number of columns (fields).
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Get a value for a specific identifier and column.
    pub fn get(&self, id: &str, column: &str) -> Option<&Variable> {
        self.data.get(id).and_then(|m| m.get(column))
    }

    /// All values for one identifier, in column order.
    pub fn row(&self, id: &str) -> Result<Vec<Variable>> {
        let values = self.data.get(id).ok_or_else(|| {
            ConnectivityError::SampleMismatch(format!("'{}' not found in metadata", id))
        })?;
        Ok(self
            .column_names
            .iter()
            .map(|c| values.get(c).cloned().unwrap_or(Variable::Missing))
            .collect())
    }

    /// Get all values for a column, in row order.
    pub fn column(&self, column: &str) -> Result<Vec<&Variable>> {
        if !self.has_column(column) {
            return Err(ConnectivityError::MissingField(column.to_string()));
        }
        Ok(self
            .ids
            .iter()
            .map(|id| {
                self.data
                    .get(id)
                    .and_then(|m| m.get(column))
                    .unwrap_or(&Variable::Missing)
            })
            .collect())
    }

    /// Get sorted unique levels of a column, rendered as strings.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        let values = self.column(column)?;
        let mut levels: Vec<String> = values
            .iter()
            .filter(|v| !v.is_missing())
            .map(|v| v.to_string())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        levels.sort();
        Ok(levels)
    }

    /// Subset metadata to the given identifiers, in the given order.
    pub fn subset(&self, ids: &[String]) -> Result<Self> {
        let mut new_data = HashMap::with_capacity(ids.len());
        let mut new_ids = Vec::with_capacity(ids.len());

        for id in ids {
            let row = self.data.get(id).ok_or_else(|| {
                ConnectivityError::SampleMismatch(format!("'{}' not found in metadata", id))
            })?;
            if new_data.insert(id.clone(), row.clone()).is_some() {
                return Err(ConnectivityError::SampleMismatch(format!(
                    "Duplicate identifier '{}'",
                    id
                )));
            }
            new_ids.push(id.clone());
        }

        Ok(Self {
            ids: new_ids,
            column_names: self.column_names.clone(),
            data: new_data,
        })
    }

    /// Align metadata to an axis: same identifiers, same order, nothing extra.
    pub fn align_to(&self, ids: &[String]) -> Result<Self> {
        if ids.len() != self.n_rows() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: ids.len(),
                actual: self.n_rows(),
            });
        }
        self.subset(ids)
    }

    /// Add or overwrite a column with one value per row, in row order.
    pub fn set_column(&mut self, column: &str, values: Vec<Variable>) -> Result<()> {
        if values.len() != self.n_rows() {
            return Err(ConnectivityError::DimensionMismatch {
                expected: self.n_rows(),
                actual: values.len(),
            });
        }
        if !self.has_column(column) {
            self.column_names.push(column.to_string());
        }
        for (id, value) in self.ids.iter().zip(values) {
            self.data
                .entry(id.clone())
                .or_default()
                .insert(column.to_string(), value);
        }
        Ok(())
    }

    /// Add or overwrite a column holding the same value for every row.
    pub fn set_constant(&mut self, column: &str, value: Variable) {
        if !self.has_column(column) {
            self.column_names.push(column.to_string());
        }
        for row in self.data.values_mut() {
            row.insert(column.to_string(), value.clone());
        }
    }

    /// Check if an identifier exists.
    pub fn has_id(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}
