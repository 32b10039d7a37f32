//! Stamping the metric used for a result onto its metadata.

use crate::data::{Metadata, Variable};

/// Metadata field recording the similarity metric.
pub const SIMILARITY_METRIC_FIELD: &str = "similarity_metric";
/// Metadata field recording the connectivity metric.
pub const CONNECTIVITY_METRIC_FIELD: &str = "connectivity_metric";

/// Add (or overwrite) `field` with `metric_name` on every row.
pub fn annotate_metric(metadata: &mut Metadata, field: &str, metric_name: &str) {
    metadata.set_constant(field, Variable::from(metric_name));
}
