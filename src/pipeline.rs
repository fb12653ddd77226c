use std::future::Future;

use thiserror::Error;
use tracing::{info, warn};

use crate::llm::LlmGateway;
use crate::models::{
    BatchIntegrityError, BatchResult, ClaimId, ExtractedClaim, ExtractionStats, QueueAssignment,
    RawClaimText, RoutingStats, SeverityAssessment, SeverityStats,
};
use crate::stages::{
    ASSESSMENT_STAGE, AssessmentConfig, EXTRACTION_STAGE, ExtractionConfig, ROUTING_STAGE,
    RoutingConfig, assess, extract, route,
};

/// Fatal pipeline failure; per-claim problems never end up here
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("batch integrity violated: {0}")]
    Integrity(#[from] BatchIntegrityError),

    #[error("pipeline cancelled")]
    Cancelled,
}

/// Configuration for a full run
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub assessment: AssessmentConfig,
    pub routing: RoutingConfig,
}

impl PipelineConfig {
    pub fn with_feedback_loop(mut self, enabled: bool) -> Self {
        self.extraction.feedback_loop = enabled;
        self
    }

    /// Same bound for every stage that calls the model
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        self.extraction.concurrency = concurrency;
        self.assessment.concurrency = concurrency;
        self
    }
}

/// Output of all three stages
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub extraction: BatchResult<ExtractedClaim, ExtractionStats>,
    pub assessment: BatchResult<SeverityAssessment, SeverityStats>,
    pub routing: BatchResult<QueueAssignment, RoutingStats>,
}

/// Run extraction, assessment and routing over a batch
///
/// Each stage starts only once the previous one has a record for every
/// claim. Every stage output is checked against the input ids.
pub async fn run_pipeline(
    gateway: &dyn LlmGateway,
    raw_texts: &[RawClaimText],
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    let ids: Vec<ClaimId> = raw_texts.iter().map(|r| r.claim_id.clone()).collect();

    let extraction = extract(gateway, raw_texts, &config.extraction).await?;
    extraction.verify_against(EXTRACTION_STAGE, &ids)?;

    let assessment = assess(gateway, &extraction.records, &config.assessment).await?;
    assessment.verify_against(ASSESSMENT_STAGE, &ids)?;

    let routing = route(&extraction.records, &assessment.records, &config.routing)?;
    routing.verify_against(ROUTING_STAGE, &ids)?;

    info!("Pipeline complete: {} claims routed", routing.len());

    Ok(PipelineOutput {
        extraction,
        assessment,
        routing,
    })
}

/// [`run_pipeline`], abandoned as soon as `cancel` resolves
///
/// In-flight model calls are dropped; nothing partial is returned.
pub async fn run_pipeline_until<C>(
    gateway: &dyn LlmGateway,
    raw_texts: &[RawClaimText],
    config: &PipelineConfig,
    cancel: C,
) -> Result<PipelineOutput, PipelineError>
where
    C: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = cancel => {
            warn!("Cancellation requested, abandoning in-flight requests");
            Err(PipelineError::Cancelled)
        }
        result = run_pipeline(gateway, raw_texts, config) => result,
    }
}
