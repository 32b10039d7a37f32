//! Composite cohort keys built from metadata fields.

use crate::data::{IndexedAxis, Metadata, Variable};
use crate::error::{ConnectivityError, Result};
use serde::{Deserialize, Serialize};

/// Separator placed between field values in a cohort key.
pub const DEFAULT_SEPARATOR: &str = ":";

fn default_fields() -> Vec<String> {
    vec![
        "pert_id".to_string(),
        "cell_id".to_string(),
        "pert_time".to_string(),
    ]
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// The three independent field lists used to group samples into cohorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortFields {
    /// Fields of the test matrix columns (queries).
    #[serde(default = "default_fields")]
    pub query_fields: Vec<String>,
    /// Fields of the test matrix rows (targets).
    #[serde(default = "default_fields")]
    pub target_fields: Vec<String>,
    /// Fields of both axes of the background matrix.
    #[serde(default = "default_fields")]
    pub background_fields: Vec<String>,
    /// Separator between field values.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for CohortFields {
    fn default() -> Self {
        Self {
            query_fields: default_fields(),
            target_fields: default_fields(),
            background_fields: default_fields(),
            separator: default_separator(),
        }
    }
}

impl CohortFields {
    /// Use the same field list for queries, targets and background.
    pub fn uniform(fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        Self {
            query_fields: fields.clone(),
            target_fields: fields.clone(),
            background_fields: fields,
            separator: default_separator(),
        }
    }

    /// Reject empty field lists or an empty separator.
    pub fn validate(&self) -> Result<()> {
        for (name, fields) in [
            ("query", &self.query_fields),
            ("target", &self.target_fields),
            ("background", &self.background_fields),
        ] {
            if fields.is_empty() {
                return Err(ConnectivityError::InvalidParameter(format!(
                    "No {} fields given for cohort keys",
                    name
                )));
            }
        }
        if self.separator.is_empty() {
            return Err(ConnectivityError::InvalidParameter(
                "Cohort key separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A value containing the separator would make two different field
/// combinations share one key, so it is rejected.
fn join_columns(
    fields: &[String],
    columns: &[Vec<&Variable>],
    n: usize,
    separator: &str,
) -> Result<Vec<String>> {
    (0..n)
        .map(|i| {
            let parts = fields
                .iter()
                .zip(columns)
                .map(|(field, col)| {
                    let value = col[i].to_string();
                    if value.contains(separator) {
                        return Err(ConnectivityError::InvalidParameter(format!(
                            "Value '{}' of field '{}' contains the cohort key separator '{}'",
                            value, field, separator
                        )));
                    }
                    Ok(value)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(parts.join(separator))
        })
        .collect()
}

/// Build one key per row of `metadata`, in its row order.
///
/// The key is the value of each field in `fields` order, joined by
/// `separator`. Missing values render as `NA`.
pub fn build_cohort_keys(
    metadata: &Metadata,
    fields: &[String],
    separator: &str,
) -> Result<Vec<String>> {
    if fields.is_empty() {
        return Err(ConnectivityError::InvalidParameter(
            "At least one field is needed to build cohort keys".to_string(),
        ));
    }
    let columns = fields
        .iter()
        .map(|f| metadata.column(f))
        .collect::<Result<Vec<_>>>()?;
    join_columns(fields, &columns, metadata.n_rows(), separator)
}

/// Same as [`build_cohort_keys`], reading the fields from an indexed axis.
pub fn axis_cohort_keys(axis: &IndexedAxis, fields: &[String], separator: &str) -> Result<Vec<String>> {
    if fields.is_empty() {
        return Err(ConnectivityError::InvalidParameter(
            "At least one field is needed to build cohort keys".to_string(),
        ));
    }
    let columns = fields
        .iter()
        .map(|f| axis.level(f))
        .collect::<Result<Vec<_>>>()?;
    join_columns(fields, &columns, axis.len(), separator)
}

/// Positions that sort `keys` ascending; equal keys keep their input order.
pub fn stable_key_order(keys: &[String]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_metadata() -> Metadata {
        Metadata::from_rows(
            vec!["pert_id".to_string(), "cell_id".to_string(), "pert_time".to_string()],
            vec![
                ("s1".to_string(), vec!["BRD-2".into(), "PC3".into(), 24i64.into()]),
                ("s2".to_string(), vec!["BRD-1".into(), "A375".into(), 6i64.into()]),
                ("s3".to_string(), vec!["BRD-1".into(), "A375".into(), Variable::Missing]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_keys_follow_field_order() {
        let meta = create_test_metadata();
        let fields = vec!["cell_id".to_string(), "pert_id".to_string()];
        let keys = build_cohort_keys(&meta, &fields, ":").unwrap();
        assert_eq!(keys, vec!["PC3:BRD-2", "A375:BRD-1", "A375:BRD-1"]);
    }

    #[test]
    fn test_missing_value_renders_na() {
        let meta = create_test_metadata();
        let keys = build_cohort_keys(&meta, &CohortFields::default().query_fields, "|").unwrap();
        assert_eq!(keys[2], "BRD-1|A375|NA");
        assert_eq!(keys[0], "BRD-2|PC3|24");
    }

    #[test]
    fn test_absent_field_fails() {
        let meta = create_test_metadata();
        let err = build_cohort_keys(&meta, &["dose".to_string()], ":").unwrap_err();
        assert!(matches!(err, ConnectivityError::MissingField(ref f) if f == "dose"));
    }

    #[test]
    fn test_empty_field_list_fails() {
        let meta = create_test_metadata();
        assert!(build_cohort_keys(&meta, &[], ":").is_err());
    }

    #[test]
    fn test_value_containing_separator_fails() {
        // "A:B" + "C" and "A" + "B:C" would both join to "A:B:C".
        let meta = Metadata::from_rows(
            vec!["pert_id".to_string(), "cell_id".to_string()],
            vec![
                ("s1".to_string(), vec!["A:B".into(), "C".into()]),
                ("s2".to_string(), vec!["A".into(), "B:C".into()]),
            ],
        )
        .unwrap();
        let fields = vec!["pert_id".to_string(), "cell_id".to_string()];
        let err = build_cohort_keys(&meta, &fields, ":").unwrap_err();
        assert!(matches!(err, ConnectivityError::InvalidParameter(ref msg) if msg.contains("A:B")));

        let keys = build_cohort_keys(&meta, &fields, "|").unwrap();
        assert_eq!(keys, vec!["A:B|C", "A|B:C"]);
    }

    #[test]
    fn test_deterministic() {
        let meta = create_test_metadata();
        let fields = CohortFields::default().target_fields;
        let first = build_cohort_keys(&meta, &fields, ":").unwrap();
        let second = build_cohort_keys(&meta.clone(), &fields, ":").unwrap();
        assert_eq!(first, second);
        assert_eq!(stable_key_order(&first), stable_key_order(&second));
    }

    #[test]
    fn test_stable_order_keeps_ties() {
        let keys: Vec<String> = vec!["b".into(), "a".into(), "b".into(), "a".into()];
        assert_eq!(stable_key_order(&keys), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_fields_validate() {
        assert!(CohortFields::default().validate().is_ok());
        let mut fields = CohortFields::uniform(&["pert_id"]);
        fields.background_fields.clear();
        assert!(fields.validate().is_err());
        let mut fields = CohortFields::uniform(&["pert_id"]);
        fields.separator.clear();
        assert!(fields.validate().is_err());
    }
}
