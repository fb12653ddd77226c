use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::llm::schema::assessment_schema;
use crate::llm::{LlmGateway, build_assessment_prompt, invoke_as, validate_assessment};
use crate::models::{
    AssessmentPayload, BatchIntegrityError, BatchResult, ClaimId, ExtractedClaim, Severity,
    SeverityAssessment, SeverityStats, verify_alignment,
};

pub const ASSESSMENT_STAGE: &str = "assessment";

/// Configuration for Stage II
#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    /// Maximum in-flight model calls
    pub concurrency: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Execute Stage II: severity assessment
///
/// One model call per claim that has something to assess. Claims without a
/// damage description get an "insufficient information" record instead of a
/// guessed severity. Statistics are computed once every claim is done.
pub async fn assess(
    gateway: &dyn LlmGateway,
    claims: &[ExtractedClaim],
    config: &AssessmentConfig,
) -> Result<BatchResult<SeverityAssessment, SeverityStats>, BatchIntegrityError> {
    info!("Stage II: Assessing {} claims", claims.len());

    let records: Vec<SeverityAssessment> = stream::iter(claims)
        .map(|claim| assess_claim(gateway, claim))
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let expected: Vec<ClaimId> = claims.iter().map(|c| c.claim_id.clone()).collect();
    verify_alignment(ASSESSMENT_STAGE, &expected, &records)?;

    let stats = SeverityStats::from_assessments(&records);
    info!(
        "Stage II: {} minor, {} moderate, {} major, {} insufficient information",
        stats.count(Severity::Minor),
        stats.count(Severity::Moderate),
        stats.count(Severity::Major),
        stats.insufficient_information
    );

    Ok(BatchResult { records, stats })
}

/// Text the assessment is based on, if there is any
///
/// The extracted damage description when present. A claim whose extraction
/// failed outright falls back to its report text; a successful extraction
/// that found no damage never does.
pub fn assessment_basis(claim: &ExtractedClaim) -> Option<&str> {
    if let Some(description) = claim.damage_description() {
        return Some(description);
    }

    if claim.extraction_failed() {
        let text = claim.source_text.trim();
        if !text.is_empty() {
            return Some(text);
        }
    }

    None
}

/// Assess one claim; never fails
pub async fn assess_claim(gateway: &dyn LlmGateway, claim: &ExtractedClaim) -> SeverityAssessment {
    let Some(basis) = assessment_basis(claim) else {
        debug!("{}: no damage description, skipping model", claim.claim_id);
        return SeverityAssessment::insufficient(
            claim.claim_id.clone(),
            "no damage description reported",
        );
    };

    let prompt = build_assessment_prompt(claim, basis);
    let result = invoke_as::<AssessmentPayload>(gateway, &prompt, &assessment_schema())
        .await
        .and_then(|payload| Ok(validate_assessment(&claim.claim_id, payload)?));

    match result {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!("{}: assessment failed: {}", claim.claim_id, e);
            SeverityAssessment::insufficient(
                claim.claim_id.clone(),
                format!("assessment failed: {}", e),
            )
        }
    }
}
