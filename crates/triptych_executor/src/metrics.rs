//! Scoring metrics for the comparator. Higher scores are better.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use triptych_core::VariationResult;

/// A deterministic score for one successful variation.
pub trait Metric: Send + Sync {
    /// Score the variation; higher is better.
    fn score(&self, result: &VariationResult) -> f64;

    /// One-line description for listings.
    fn description(&self) -> &'static str;
}

/// `1000 / (1000 + response_time_ms)`: 1.0 for an instant answer, 0.5 at one second.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseLatency;

impl Metric for ResponseLatency {
    fn score(&self, result: &VariationResult) -> f64 {
        inverse_millis(result.response.response_time_ms)
    }

    fn description(&self) -> &'static str {
        "provider response time, faster is better"
    }
}

/// `1000 / (1000 + execution_time_ms)` over the whole variation, function calls included.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalTime;

impl Metric for TotalTime {
    fn score(&self, result: &VariationResult) -> f64 {
        inverse_millis(result.execution_time_ms)
    }

    fn description(&self) -> &'static str {
        "end-to-end variation time, faster is better"
    }
}

/// Character count of the response text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseLength;

impl Metric for ResponseLength {
    fn score(&self, result: &VariationResult) -> f64 {
        result
            .response
            .response_text
            .as_deref()
            .map_or(0.0, |t| t.chars().count() as f64)
    }

    fn description(&self) -> &'static str {
        "response length in characters, longer is better"
    }
}

/// Distinct lower-cased words over total words; 0 for an empty response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalDiversity;

impl Metric for LexicalDiversity {
    fn score(&self, result: &VariationResult) -> f64 {
        let text = result.response.response_text.as_deref().unwrap_or_default();
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        if words.is_empty() {
            return 0.0;
        }
        let distinct: HashSet<&String> = words.iter().collect();
        distinct.len() as f64 / words.len() as f64
    }

    fn description(&self) -> &'static str {
        "share of distinct words, more varied is better"
    }
}

/// Completion tokens over total tokens; 0 when usage is not reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenEfficiency;

impl Metric for TokenEfficiency {
    fn score(&self, result: &VariationResult) -> f64 {
        match (
            result.response.usage.completion_tokens,
            result.response.usage.total_tokens,
        ) {
            (Some(completion), Some(total)) if total > 0 => completion as f64 / total as f64,
            _ => 0.0,
        }
    }

    fn description(&self) -> &'static str {
        "completion share of billed tokens"
    }
}

/// Successful function calls over all function calls; 1.0 when none were made.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionSuccessRate;

impl Metric for FunctionSuccessRate {
    fn score(&self, result: &VariationResult) -> f64 {
        if result.function_calls.is_empty() {
            return 1.0;
        }
        let ok = result
            .function_calls
            .iter()
            .filter(|c| c.execution_status == triptych_core::FunctionCallStatus::Success)
            .count();
        ok as f64 / result.function_calls.len() as f64
    }

    fn description(&self) -> &'static str {
        "share of function calls that resolved"
    }
}

fn inverse_millis(ms: u64) -> f64 {
    1000.0 / (1000.0 + ms as f64)
}

/// Metrics addressable by name.
///
/// [`MetricRegistry::default`] registers the built-in metrics; custom metrics
/// may be added under any name.
#[derive(Clone)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, Arc<dyn Metric>>,
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &self.metrics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MetricRegistry {
    /// Registry with no metrics.
    pub fn empty() -> Self {
        Self {
            metrics: BTreeMap::new(),
        }
    }

    /// Register a metric under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, metric: Arc<dyn Metric>) {
        self.metrics.insert(name.into(), metric);
    }

    /// Register a metric, builder style.
    pub fn with(mut self, name: impl Into<String>, metric: Arc<dyn Metric>) -> Self {
        self.register(name, metric);
        self
    }

    /// Metric registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Metric>> {
        self.metrics.get(name).cloned()
    }

    /// Registered names with descriptions, sorted by name.
    pub fn describe(&self) -> Vec<(String, &'static str)> {
        self.metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.description()))
            .collect()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        let latency: Arc<dyn Metric> = Arc::new(ResponseLatency);
        Self::empty()
            .with("latency", latency.clone())
            .with("response_time", latency)
            .with("total_time", Arc::new(TotalTime))
            .with("response_length", Arc::new(ResponseLength))
            .with("lexical_diversity", Arc::new(LexicalDiversity))
            .with("token_efficiency", Arc::new(TokenEfficiency))
            .with("function_success_rate", Arc::new(FunctionSuccessRate))
    }
}
