//! Grouping of samples into cohorts by composite metadata keys.

pub mod key;
pub mod matrix;

pub use key::{
    axis_cohort_keys, build_cohort_keys, stable_key_order, CohortFields, DEFAULT_SEPARATOR,
};
pub use matrix::{prepare_cohort_matrices, CohortMatrix, QUERY_FIELD, TARGET_FIELD};
