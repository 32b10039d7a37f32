//! Error types for the profile-connectivity library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("Feature mismatch: {0}")]
    FeatureMismatch(String),

    #[error("Missing field '{0}' in metadata")]
    MissingField(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Sample ID mismatch: {0}")]
    SampleMismatch(String),

    #[error("Unknown {kind} metric '{name}'")]
    UnknownMetric { kind: &'static str, name: String },

    #[error("Empty distribution: {0}")]
    EmptyDistribution(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConnectivityError {
    /// Whether this error means two tables disagree on their shape or fields.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            Self::FeatureMismatch(_)
                | Self::MissingField(_)
                | Self::DimensionMismatch { .. }
                | Self::SampleMismatch(_)
        )
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ConnectivityError>;
