//! Profile Similarity and Connectivity Library
//!
//! This library scores how strongly groups of external perturbation profiles
//! resemble groups of reference profiles, relative to a background
//! distribution of reference-versus-reference similarities.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (AnnotatedMatrix, IndexedMatrix, Metadata)
//! - **similarity**: Rank (Spearman) and raw (Pearson) correlation between sample columns
//! - **cohort**: Composite cohort keys and cohort-relabeled matrices
//! - **symmetry**: Self/cross comparison detection and the sampling policy
//! - **connectivity**: KS and percentile connectivity per cohort pair
//! - **annotate**: Metric annotation of output metadata
//! - **pipeline**: Configuration and execution of a full run
//!
//! # Example
//!
//! ```no_run
//! use profile_connectivity::prelude::*;
//! # fn load() -> (AnnotatedMatrix, AnnotatedMatrix, AnnotatedMatrix) { unimplemented!() }
//!
//! let (external, internal, background) = load();
//!
//! let output = Pipeline::new()
//!     .similarity_metric(SimilarityMetric::Spearman)
//!     .connectivity_metric(ConnectivityMetric::KsTest)
//!     .query_fields(&["pert_id", "cell_id", "pert_time"])
//!     .target_fields(&["pert_id", "cell_id", "pert_time"])
//!     .background_fields(&["pert_id", "cell_id", "pert_time"])
//!     .run(&external, &internal, &background)
//!     .unwrap();
//!
//! println!("{:?}", output.connectivity.data());
//! ```

pub mod annotate;
pub mod cohort;
pub mod connectivity;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod similarity;
pub mod symmetry;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::annotate::{annotate_metric, CONNECTIVITY_METRIC_FIELD, SIMILARITY_METRIC_FIELD};
    pub use crate::cohort::{
        build_cohort_keys, prepare_cohort_matrices, CohortFields, CohortMatrix, QUERY_FIELD,
        TARGET_FIELD,
    };
    pub use crate::connectivity::{
        compute_connectivities, ks_test, percentile_score, ConnectivityMatrix, ConnectivityMetric,
        ConnectivityResult, PairScore,
    };
    pub use crate::data::{AnnotatedMatrix, IndexedMatrix, Metadata, Variable};
    pub use crate::error::{ConnectivityError, Result};
    pub use crate::pipeline::{Pipeline, PipelineConfig, RunOutput};
    pub use crate::similarity::{
        compute_self_similarity, compute_similarity, correlation_matrix, SimilarityMetric,
    };
    pub use crate::symmetry::{check_symmetry, detect_comparison, Comparison, SamplingPolicy};
}
