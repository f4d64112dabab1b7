//! Generation orchestrator.
//!
//! Sequences one request through
//! `Received → CreditChecked → Proxied → Normalized → Committed → Recorded →
//! Responded`. Any failure exits to `Failed`. The staged upload is released
//! before the outcome is returned on every path, and credits are only charged
//! once the upstream reply has been normalised into an image reference.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error, info, warn};

use crate::domain::credits::CreditLedgerGuard;
use crate::domain::ports::{
    CreditLedger, GenerateRequest, GenerateResponse, GenerationBackend, GenerationCommand,
    GenerationMetrics, GenerationOutcome, HistoryRepository, NoOpGenerationMetrics,
};
use crate::domain::{
    Error, GenerationCost, HistoryRecord, HistoryRecordId, StagedUpload, UserId,
};

use super::{GenerationError, GenerationStage, ResponseNormalizer, ShapeSniffingNormalizer};

/// Tunables for [`GenerationService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
    /// Credits charged per successful generation.
    pub cost: GenerationCost,
    /// How many times a history insert is attempted after the charge.
    pub history_write_attempts: NonZeroU32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            cost: GenerationCost::default(),
            history_write_attempts: NonZeroU32::MIN,
        }
    }
}

/// Generation service implementing [`GenerationCommand`].
pub struct GenerationService<L: ?Sized, H: ?Sized, B: ?Sized> {
    guard: CreditLedgerGuard<L>,
    history: Arc<H>,
    backend: Arc<B>,
    normalizer: Arc<dyn ResponseNormalizer>,
    metrics: Arc<dyn GenerationMetrics>,
    clock: Arc<dyn Clock>,
    history_write_attempts: NonZeroU32,
}

impl<L: ?Sized, H: ?Sized, B: ?Sized> Clone for GenerationService<L, H, B> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            history: Arc::clone(&self.history),
            backend: Arc::clone(&self.backend),
            normalizer: Arc::clone(&self.normalizer),
            metrics: Arc::clone(&self.metrics),
            clock: Arc::clone(&self.clock),
            history_write_attempts: self.history_write_attempts,
        }
    }
}

impl<L, H, B> GenerationService<L, H, B>
where
    L: CreditLedger + ?Sized,
    H: HistoryRepository + ?Sized,
    B: GenerationBackend + ?Sized,
{
    /// Create a service using the shape-sniffing normalizer and no metrics.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use headshot_backend::domain::GenerationService;
    /// # use headshot_backend::domain::ports::{
    /// #     FixtureCreditLedger, FixtureGenerationBackend, FixtureHistoryRepository,
    /// # };
    /// # use mockable::DefaultClock;
    /// let service = GenerationService::new(
    ///     Arc::new(FixtureCreditLedger::default()),
    ///     Arc::new(FixtureHistoryRepository),
    ///     Arc::new(FixtureGenerationBackend),
    ///     Arc::new(DefaultClock),
    ///     Default::default(),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(
        ledger: Arc<L>,
        history: Arc<H>,
        backend: Arc<B>,
        clock: Arc<dyn Clock>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            guard: CreditLedgerGuard::new(ledger, settings.cost),
            history,
            backend,
            normalizer: Arc::new(ShapeSniffingNormalizer),
            metrics: Arc::new(NoOpGenerationMetrics),
            clock,
            history_write_attempts: settings.history_write_attempts,
        }
    }

    /// Replace the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn GenerationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the response normalizer.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn ResponseNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Run the pipeline and report failures with their typed cause.
    pub async fn run(&self, request: GenerateRequest) -> Result<GenerateResponse, GenerationError> {
        let GenerateRequest { user_id, upload } = request;
        debug!(stage = %GenerationStage::Received, %user_id, "generation request received");

        let result = match upload {
            Some(mut upload) => {
                let result = if upload.is_empty() {
                    Err(GenerationError::MissingUpload)
                } else {
                    self.process(&user_id, &upload).await
                };
                release_upload(&mut upload, &user_id);
                result
            }
            None => Err(GenerationError::MissingUpload),
        };

        match &result {
            Ok(response) => {
                info!(
                    stage = %GenerationStage::Responded,
                    %user_id,
                    credits_remaining = %response.credits_remaining,
                    "generation completed"
                );
                self.record_outcome(GenerationOutcome::Succeeded).await;
            }
            Err(err) => {
                warn!(
                    stage = %GenerationStage::Failed,
                    %user_id,
                    error = %err,
                    "generation failed"
                );
                self.record_outcome(err.outcome()).await;
            }
        }
        result
    }

    async fn process(
        &self,
        user_id: &UserId,
        upload: &StagedUpload,
    ) -> Result<GenerateResponse, GenerationError> {
        let reservation = self.guard.check_and_reserve(user_id).await?;
        debug!(
            stage = %GenerationStage::CreditChecked,
            %user_id,
            balance = %reservation.observed_balance(),
            "credit check passed"
        );

        let upstream = self.backend.forward(upload).await?;
        debug!(stage = %GenerationStage::Proxied, %user_id, "upstream replied");

        let canonical = self.normalizer.normalize(&upstream)?;
        debug!(
            stage = %GenerationStage::Normalized,
            %user_id,
            image_reference_len = canonical.image_reference.as_str().len(),
            "upstream reply normalised"
        );

        let record_id = HistoryRecordId::random();
        let credits_remaining = self.guard.commit(reservation).await?;
        debug!(
            stage = %GenerationStage::Committed,
            %user_id,
            %credits_remaining,
            "credits deducted"
        );

        let record = HistoryRecord {
            id: record_id,
            owner: user_id.clone(),
            source_reference: upload.source_reference(),
            result_reference: canonical.image_reference,
            created_at: self.clock.utc(),
        };
        self.record_history(&record).await?;
        debug!(
            stage = %GenerationStage::Recorded,
            %user_id,
            record_id = %record.id,
            "history recorded"
        );

        Ok(GenerateResponse {
            image_reference: record.result_reference,
            credits_remaining,
        })
    }

    async fn record_history(&self, record: &HistoryRecord) -> Result<(), GenerationError> {
        let attempts = self.history_write_attempts.get();
        let mut attempt = 1;
        loop {
            match self.history.insert(record).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts => {
                    warn!(
                        record_id = %record.id,
                        attempt,
                        error = %err,
                        "history write failed; retrying"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        record_id = %record.id,
                        user_id = %record.owner,
                        result_reference = %record.result_reference,
                        error = %err,
                        "history write failed after credits were charged"
                    );
                    return Err(err.into());
                }
            }
        }
    }

    async fn record_outcome(&self, outcome: GenerationOutcome) {
        if let Err(err) = self.metrics.record(outcome).await {
            warn!(outcome = outcome.as_label(), error = %err, "failed to record generation metric");
        }
    }
}

fn release_upload(upload: &mut StagedUpload, user_id: &UserId) {
    if let Err(err) = upload.release() {
        error!(%user_id, error = %err, "failed to remove staged upload");
    }
}

#[async_trait]
impl<L, H, B> GenerationCommand for GenerationService<L, H, B>
where
    L: CreditLedger + ?Sized,
    H: HistoryRepository + ?Sized,
    B: GenerationBackend + ?Sized,
{
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, Error> {
        self.run(request).await.map_err(Error::from)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
