//! Connectivity scoring of cohort pairs against a background distribution.

pub mod compute;
pub mod ks;
pub mod percentile;
pub mod sampling;

pub use compute::{
    compute_connectivities, direction, ConnectivityMatrix, ConnectivityMetric, ConnectivityResult, PairScore,
};
pub use ks::{ks_statistic, ks_test};
pub use percentile::{percentile_of_score, percentile_score};
pub use sampling::{
    background_values, foreground_values, select_cells, Background, BackgroundSource,
};
