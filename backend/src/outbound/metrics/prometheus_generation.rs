//! Prometheus adapter for generation outcome counts.

use async_trait::async_trait;
use prometheus::{CounterVec, Opts, Registry};

use crate::domain::ports::{GenerationMetrics, GenerationMetricsError, GenerationOutcome};

/// Prometheus-backed generation metrics recorder.
///
/// # Exported series
///
/// - **Name**: `headshot_generations_total`
/// - **Type**: Counter
/// - **Labels**: `outcome`, one of the [`GenerationOutcome`] labels such as
///   `succeeded` or `insufficient_credits`
pub struct PrometheusGenerationMetrics {
    generations_total: CounterVec,
}

impl PrometheusGenerationMetrics {
    /// Create and register the counter with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error when a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let generations_total = CounterVec::new(
            Opts::new(
                "headshot_generations_total",
                "Finished generation requests by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(generations_total.clone()))?;
        Ok(Self { generations_total })
    }
}

#[async_trait]
impl GenerationMetrics for PrometheusGenerationMetrics {
    async fn record(&self, outcome: GenerationOutcome) -> Result<(), GenerationMetricsError> {
        self.generations_total
            .get_metric_with_label_values(&[outcome.as_label()])
            .map_err(|err| GenerationMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }
}
