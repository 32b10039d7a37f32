//! Serializable pipeline configuration.

use crate::cohort::CohortFields;
use crate::connectivity::ConnectivityMetric;
use crate::error::{ConnectivityError, Result};
use crate::similarity::SimilarityMetric;
use serde::{Deserialize, Serialize};

fn default_name() -> String {
    "connectivity".to_string()
}

fn default_similarity_metric() -> String {
    SimilarityMetric::default().name().to_string()
}

fn default_connectivity_metric() -> String {
    ConnectivityMetric::default().name().to_string()
}

/// Pipeline configuration for serialization.
///
/// Metric names are kept as written so that an unknown name surfaces as
/// [`ConnectivityError::UnknownMetric`] from [`PipelineConfig::validate`]
/// rather than as a parse failure of the whole document.
///
/// ```yaml
/// name: lincs
/// similarity_metric: spearman
/// connectivity_metric: ks_test
/// query_fields: [pert_id, cell_id, pert_time]
/// target_fields: [pert_id, cell_id, pert_time]
/// background_fields: [pert_id, cell_id, pert_time]
/// separator: ":"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the run.
    #[serde(default = "default_name")]
    pub name: String,
    /// Similarity metric name (`spearman` or `pearson`).
    #[serde(default = "default_similarity_metric")]
    pub similarity_metric: String,
    /// Connectivity metric name (`ks_test` or `percentile_score`).
    #[serde(default = "default_connectivity_metric")]
    pub connectivity_metric: String,
    /// Cohort key fields and separator.
    #[serde(flatten)]
    pub fields: CohortFields,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            similarity_metric: default_similarity_metric(),
            connectivity_metric: default_connectivity_metric(),
            fields: CohortFields::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(ConnectivityError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ConnectivityError::from)
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ConnectivityError::from)
    }

    /// Save to pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ConnectivityError::from)
    }

    /// Parsed similarity metric.
    pub fn similarity(&self) -> Result<SimilarityMetric> {
        self.similarity_metric.parse()
    }

    /// Parsed connectivity metric.
    pub fn connectivity(&self) -> Result<ConnectivityMetric> {
        self.connectivity_metric.parse()
    }

    /// Check metric names and cohort fields.
    pub fn validate(&self) -> Result<()> {
        self.similarity()?;
        self.connectivity()?;
        self.fields.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = PipelineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.similarity().unwrap(), SimilarityMetric::Spearman);
        assert_eq!(config.connectivity().unwrap(), ConnectivityMetric::KsTest);
        assert_eq!(config.fields.query_fields, vec!["pert_id", "cell_id", "pert_time"]);
        assert_eq!(config.fields.separator, ":");
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
name: screen
similarity_metric: pearson
connectivity_metric: percentile_score
query_fields: [pert_id]
target_fields: [pert_id, cell_id]
background_fields: [cell_id]
separator: "|"
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "screen");
        assert_eq!(config.fields.target_fields, vec!["pert_id", "cell_id"]);
        assert_eq!(config.fields.separator, "|");
        config.validate().unwrap();

        let restored = PipelineConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig {
            connectivity_metric: "percentile_score".to_string(),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"background_fields\""));
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_validate_unknown_metric() {
        let config = PipelineConfig::from_yaml("similarity_metric: kendall").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConnectivityError::UnknownMetric { kind: "similarity", .. })
        ));

        let config = PipelineConfig::from_yaml("connectivity_metric: wtcs").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConnectivityError::UnknownMetric { kind: "connectivity", .. })
        ));
    }

    #[test]
    fn test_validate_empty_fields() {
        let config = PipelineConfig::from_yaml("query_fields: []").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConnectivityError::InvalidParameter(_))
        ));
    }
}
