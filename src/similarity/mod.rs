//! Pairwise profile similarity.

pub mod correlation;

pub use correlation::{
    compute_self_similarity, compute_similarity, correlation_matrix, rank_average,
    SimilarityMetric,
};
