//! Comparison configuration and results.

use crate::ApiConfiguration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

fn default_comparison_type() -> String {
    "performance".to_string()
}

/// Requests a comparison of a run's successful variations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Whether to compare at all
    #[serde(default)]
    pub enabled: bool,
    /// Free-form comparison label
    #[serde(default = "default_comparison_type")]
    pub comparison_type: String,
    /// Metric names in priority order
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl ComparisonConfig {
    /// Enabled comparison over the given metrics.
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            comparison_type: default_comparison_type(),
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }

    /// Enabled with at least one metric.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.metrics.is_empty()
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            comparison_type: default_comparison_type(),
            metrics: Vec::new(),
        }
    }
}

/// Scores per configuration and the selected best configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Unique comparison identity
    pub id: Uuid,
    /// Run compared
    pub execution_run_id: Uuid,
    /// Comparison label
    pub comparison_type: String,
    /// Primary metric that decided the pick
    pub metric_name: String,
    /// Configuration id to metric name to score
    pub configuration_scores: BTreeMap<Uuid, BTreeMap<String, f64>>,
    /// Id of the best configuration
    pub best_configuration_id: Uuid,
    /// Snapshot of the best configuration
    pub best_configuration: ApiConfiguration,
    /// Human-readable summary of the ranking
    pub analysis_notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ComparisonResult {
    /// Score of one configuration under one metric.
    pub fn score(&self, configuration_id: Uuid, metric: &str) -> Option<f64> {
        self.configuration_scores
            .get(&configuration_id)
            .and_then(|scores| scores.get(metric))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_or_empty_is_inactive() {
        assert!(!ComparisonConfig::default().is_active());
        let mut config = ComparisonConfig::new(["latency"]);
        assert!(config.is_active());
        config.enabled = false;
        assert!(!config.is_active());
        assert!(!ComparisonConfig::new(Vec::<String>::new()).is_active());
    }

    #[test]
    fn test_deserialize_defaults_type() {
        let config: ComparisonConfig =
            serde_json::from_str(r#"{"enabled": true, "metrics": ["latency"]}"#).unwrap();
        assert_eq!(config.comparison_type, "performance");
    }
}
