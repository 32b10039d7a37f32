//! Pipeline runner chaining similarity, cohort relabeling and connectivity.

use crate::annotate::{annotate_metric, CONNECTIVITY_METRIC_FIELD, SIMILARITY_METRIC_FIELD};
use crate::cohort::{prepare_cohort_matrices, CohortFields, CohortMatrix};
use crate::connectivity::{compute_connectivities, ConnectivityMetric, ConnectivityResult};
use crate::data::AnnotatedMatrix;
use crate::error::{ConnectivityError, Result};
use crate::pipeline::config::PipelineConfig;
use crate::similarity::{compute_similarity, SimilarityMetric};
use crate::symmetry::SamplingPolicy;

/// A stage of [`Pipeline::run`], named in wrapped errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Internal × external similarity.
    Similarity,
    /// Cohort keys on both matrices.
    Relabel,
    /// Self/cross detection.
    Symmetry,
    /// Connectivity per cohort pair.
    Connectivity,
    /// Metadata and export.
    Export,
}

impl Stage {
    fn number(&self) -> usize {
        match self {
            Self::Similarity => 1,
            Self::Relabel => 2,
            Self::Symmetry => 3,
            Self::Connectivity => 4,
            Self::Export => 5,
        }
    }
}

fn in_stage<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().map_err(|e| {
        ConnectivityError::Pipeline(format!("Step {} ({:?}) failed: {}", stage.number(), stage, e))
    })
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Internal samples (rows) × external samples (columns).
    pub similarity: AnnotatedMatrix,
    /// Signed connectivity, target cohorts × query cohorts.
    pub connectivity: AnnotatedMatrix,
    /// Unsigned connectivity, target cohorts × query cohorts.
    pub unsigned_connectivity: AnnotatedMatrix,
    /// Sampling policy the scores were computed under.
    pub policy: SamplingPolicy,
}

/// Builder for configuring and running a connectivity analysis.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Set the similarity metric.
    pub fn similarity_metric(mut self, metric: SimilarityMetric) -> Self {
        self.config.similarity_metric = metric.name().to_string();
        self
    }

    /// Set the connectivity metric.
    pub fn connectivity_metric(mut self, metric: ConnectivityMetric) -> Self {
        self.config.connectivity_metric = metric.name().to_string();
        self
    }

    /// Set all cohort key fields at once.
    pub fn cohort_fields(mut self, fields: CohortFields) -> Self {
        self.config.fields = fields;
        self
    }

    /// Fields keying the query cohorts (external samples).
    pub fn query_fields(mut self, fields: &[&str]) -> Self {
        self.config.fields.query_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Fields keying the target cohorts (internal samples).
    pub fn target_fields(mut self, fields: &[&str]) -> Self {
        self.config.fields.target_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Fields keying both axes of the background.
    pub fn background_fields(mut self, fields: &[&str]) -> Self {
        self.config.fields.background_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Separator between field values in a cohort key.
    pub fn separator(mut self, separator: &str) -> Self {
        self.config.fields.separator = separator.to_string();
        self
    }

    /// The current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert to config for serialization.
    pub fn to_config(&self) -> PipelineConfig {
        self.config.clone()
    }

    /// Score every (query cohort, target cohort) pair.
    ///
    /// `external` and `internal` are feature × sample profile matrices with
    /// sample metadata on their columns. `background` is a precomputed
    /// similarity matrix among reference samples, with sample metadata on both
    /// axes.
    ///
    /// The configuration is validated before any computation; failures of a
    /// later stage are reported as [`ConnectivityError::Pipeline`] naming the
    /// stage.
    pub fn run(
        &self,
        external: &AnnotatedMatrix,
        internal: &AnnotatedMatrix,
        background: &AnnotatedMatrix,
    ) -> Result<RunOutput> {
        self.config.validate()?;
        let similarity_metric = self.config.similarity()?;
        let connectivity_metric = self.config.connectivity()?;

        tracing::debug!(
            name = %self.config.name,
            similarity = similarity_metric.name(),
            connectivity = connectivity_metric.name(),
            "running connectivity pipeline"
        );

        let similarity = in_stage(Stage::Similarity, || {
            let mut similarity = compute_similarity(internal, external, similarity_metric)?;
            annotate_metric(
                similarity.row_metadata_mut(),
                SIMILARITY_METRIC_FIELD,
                similarity_metric.name(),
            );
            annotate_metric(
                similarity.col_metadata_mut(),
                SIMILARITY_METRIC_FIELD,
                similarity_metric.name(),
            );
            Ok(similarity)
        })?;

        let (test, bg) = in_stage(Stage::Relabel, || {
            prepare_cohort_matrices(
                &similarity.to_indexed()?,
                &background.to_indexed()?,
                &self.config.fields,
            )
        })?;

        let policy = in_stage(Stage::Symmetry, || Ok(SamplingPolicy::detect(&test, &bg)))?;
        tracing::debug!(?policy, "resolved sampling policy");

        let result = in_stage(Stage::Connectivity, || {
            Ok(compute_connectivities(&test, &bg, policy, connectivity_metric))
        })?;

        let (connectivity, unsigned_connectivity) =
            in_stage(Stage::Export, || export(&test, &result, connectivity_metric))?;

        Ok(RunOutput {
            similarity,
            connectivity,
            unsigned_connectivity,
            policy,
        })
    }
}

/// Signed and unsigned matrices with cohort metadata on both axes.
fn export(
    test: &CohortMatrix,
    result: &ConnectivityResult,
    metric: ConnectivityMetric,
) -> Result<(AnnotatedMatrix, AnnotatedMatrix)> {
    let mut targets = test.row_cohort_metadata()?;
    let mut queries = test.col_cohort_metadata()?;
    annotate_metric(&mut targets, CONNECTIVITY_METRIC_FIELD, metric.name());
    annotate_metric(&mut queries, CONNECTIVITY_METRIC_FIELD, metric.name());

    Ok((
        result.signed.to_annotated(&targets, &queries)?,
        result.unsigned.to_annotated(&targets, &queries)?,
    ))
}
