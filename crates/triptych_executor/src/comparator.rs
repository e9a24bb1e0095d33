//! Ranking of successful variations.

use crate::MetricRegistry;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use triptych_core::{ComparisonConfig, ComparisonResult, VariationResult};
use triptych_error::{ComparisonError, ComparisonErrorKind};
use uuid::Uuid;

/// Scores successful variations and picks the best one.
///
/// The best configuration has the highest score under the first requested
/// metric. An exact tie falls through to the next metric, and a tie on every
/// metric keeps the earliest configuration in input order.
#[derive(Debug, Clone, Default)]
pub struct ResultComparator {
    registry: MetricRegistry,
}

impl ResultComparator {
    /// Comparator over the given metrics.
    pub fn new(registry: MetricRegistry) -> Self {
        Self { registry }
    }

    /// Metrics available to comparisons.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Compare the successful variations of one run.
    ///
    /// # Errors
    ///
    /// - `NoMetrics` if the config names no metric
    /// - `UnknownMetric` if a metric name is not registered
    /// - `NoSuccessfulVariations` if no variation succeeded
    #[instrument(
        skip(self, results, config),
        fields(metrics = ?config.metrics, variations = results.len())
    )]
    pub fn compare(
        &self,
        execution_run_id: Uuid,
        results: &[VariationResult],
        config: &ComparisonConfig,
    ) -> Result<ComparisonResult, ComparisonError> {
        let Some(primary) = config.metrics.first() else {
            return Err(ComparisonError::new(ComparisonErrorKind::NoMetrics));
        };

        let metrics = config
            .metrics
            .iter()
            .map(|name| {
                self.registry
                    .get(name)
                    .map(|metric| (name.as_str(), metric))
                    .ok_or_else(|| {
                        ComparisonError::new(ComparisonErrorKind::UnknownMetric(name.clone()))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let candidates: Vec<(&VariationResult, Vec<f64>)> = results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| (r, metrics.iter().map(|(_, m)| m.score(r)).collect()))
            .collect();

        let Some(mut best) = candidates.first() else {
            return Err(ComparisonError::new(
                ComparisonErrorKind::NoSuccessfulVariations,
            ));
        };
        for candidate in &candidates[1..] {
            if Self::rank(&candidate.1, &best.1) == Ordering::Greater {
                best = candidate;
            }
        }

        let configuration_scores: BTreeMap<Uuid, BTreeMap<String, f64>> = candidates
            .iter()
            .map(|(result, scores)| {
                let named = metrics
                    .iter()
                    .zip(scores)
                    .map(|((name, _), score)| (name.to_string(), *score))
                    .collect();
                (result.configuration.id, named)
            })
            .collect();

        let best_configuration = best.0.configuration.clone();
        debug!(
            best = %best_configuration.variation_name,
            metric = %primary,
            "Selected best variation"
        );

        Ok(ComparisonResult {
            id: Uuid::new_v4(),
            execution_run_id,
            comparison_type: config.comparison_type.clone(),
            metric_name: primary.clone(),
            configuration_scores,
            best_configuration_id: best_configuration.id,
            analysis_notes: Some(Self::notes(
                primary,
                &candidates,
                &best_configuration.variation_name,
            )),
            best_configuration,
            created_at: Utc::now(),
        })
    }

    /// Lexicographic comparison over metrics in priority order.
    fn rank(candidate: &[f64], incumbent: &[f64]) -> Ordering {
        candidate
            .iter()
            .zip(incumbent)
            .map(|(a, b)| a.total_cmp(b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    fn notes(primary: &str, candidates: &[(&VariationResult, Vec<f64>)], best: &str) -> String {
        let ranking: Vec<String> = candidates
            .iter()
            .map(|(r, scores)| format!("{}={:.4}", r.variation_name(), scores[0]))
            .collect();
        format!(
            "best variation '{}' by {} across {} successful variation(s): {}",
            best,
            primary,
            candidates.len(),
            ranking.join(", ")
        )
    }
}
