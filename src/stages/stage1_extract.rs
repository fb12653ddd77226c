use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::llm::schema::{extraction_schema, review_schema};
use crate::llm::{
    GatewayError, LlmGateway, ValidationConfig, build_extraction_prompt, build_refine_prompt,
    build_review_prompt, invoke_as, sanitize_extraction, validate_review,
};
use crate::models::{
    BatchIntegrityError, BatchResult, ClaimId, ExtractedClaim, ExtractionPayload,
    ExtractionStats, RawClaimText, ReviewFeedback, ReviewPayload, verify_alignment,
};

pub const EXTRACTION_STAGE: &str = "extraction";

/// Configuration for Stage I
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Run one review + one refine per claim after extraction
    pub feedback_loop: bool,
    /// Maximum in-flight model calls
    pub concurrency: usize,
    /// Value bounds applied to extracted fields
    pub validation: ValidationConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            feedback_loop: false,
            concurrency: 4,
            validation: ValidationConfig::default(),
        }
    }
}

/// What the feedback loop did for one claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// Loop disabled
    NotRun,
    /// Extraction failed outright, nothing to review
    Skipped,
    /// The refined extraction replaced the original
    Refined,
    ReviewFailed,
    RefineFailed,
}

/// Execute Stage I: extraction
///
/// For each report:
/// 1. Extract structured fields with one model call
/// 2. If the feedback loop is enabled, review the extraction and refine it
///
/// A failed claim is recorded as fully invalid; the batch always yields one
/// record per report, in input order.
pub async fn extract(
    gateway: &dyn LlmGateway,
    raw_texts: &[RawClaimText],
    config: &ExtractionConfig,
) -> Result<BatchResult<ExtractedClaim, ExtractionStats>, BatchIntegrityError> {
    info!(
        "Stage I: Extracting {} claims (feedback loop {})",
        raw_texts.len(),
        if config.feedback_loop { "on" } else { "off" }
    );

    let results: Vec<(ExtractedClaim, FeedbackOutcome)> = stream::iter(raw_texts)
        .map(|raw| process_claim(gateway, raw, config))
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut stats = ExtractionStats::default();
    let mut records = Vec::with_capacity(results.len());

    for (claim, outcome) in results {
        stats.record(&claim);
        match outcome {
            FeedbackOutcome::Refined => stats.refined += 1,
            FeedbackOutcome::ReviewFailed => stats.review_failed += 1,
            FeedbackOutcome::RefineFailed => stats.refine_failed += 1,
            FeedbackOutcome::NotRun | FeedbackOutcome::Skipped => {}
        }
        records.push(claim);
    }

    let expected: Vec<ClaimId> = raw_texts.iter().map(|r| r.claim_id.clone()).collect();
    verify_alignment(EXTRACTION_STAGE, &expected, &records)?;

    info!(
        "Stage I: {} valid, {} partial, {} invalid ({} refined)",
        stats.valid, stats.partial, stats.invalid, stats.refined
    );

    Ok(BatchResult { records, stats })
}

async fn process_claim(
    gateway: &dyn LlmGateway,
    raw: &RawClaimText,
    config: &ExtractionConfig,
) -> (ExtractedClaim, FeedbackOutcome) {
    let extracted = extract_claim(gateway, raw, &config.validation).await;

    if !config.feedback_loop {
        return (extracted, FeedbackOutcome::NotRun);
    }
    if extracted.extraction_error.is_some() {
        return (extracted, FeedbackOutcome::Skipped);
    }

    review_and_refine(gateway, raw, extracted, &config.validation).await
}

/// Extract one report; never fails, a bad response yields a fully invalid claim
pub async fn extract_claim(
    gateway: &dyn LlmGateway,
    raw: &RawClaimText,
    validation: &ValidationConfig,
) -> ExtractedClaim {
    if raw.is_blank() {
        warn!("{}: empty report", raw.claim_id);
        return ExtractedClaim::failed(raw, "empty report");
    }

    let prompt = build_extraction_prompt(raw);
    match invoke_as::<ExtractionPayload>(gateway, &prompt, &extraction_schema()).await {
        Ok(payload) => {
            let payload = sanitize_extraction(&raw.claim_id, payload, validation);
            let claim = ExtractedClaim::from_payload(raw, payload);
            debug!(
                "{}: extracted ({:?}, missing {:?})",
                raw.claim_id,
                claim.validity_state(),
                claim.missing_fields
            );
            claim
        }
        Err(e) => {
            warn!("{}: extraction failed: {}", raw.claim_id, e);
            ExtractedClaim::failed(raw, e.to_string())
        }
    }
}

/// Ask the model to review an extraction against the report
pub async fn review(
    gateway: &dyn LlmGateway,
    raw: &RawClaimText,
    extracted: &ExtractedClaim,
) -> Result<ReviewFeedback, GatewayError> {
    let prompt = build_review_prompt(raw, extracted);
    let payload: ReviewPayload = invoke_as(gateway, &prompt, &review_schema()).await?;
    Ok(validate_review(&raw.claim_id, payload)?)
}

/// Re-extract a report using the review findings
pub async fn refine(
    gateway: &dyn LlmGateway,
    raw: &RawClaimText,
    extracted: &ExtractedClaim,
    feedback: &ReviewFeedback,
    validation: &ValidationConfig,
) -> Result<ExtractedClaim, GatewayError> {
    let prompt = build_refine_prompt(raw, extracted, feedback);
    let payload: ExtractionPayload = invoke_as(gateway, &prompt, &extraction_schema()).await?;
    let payload = sanitize_extraction(&raw.claim_id, payload, validation);
    Ok(ExtractedClaim::from_payload(raw, payload))
}

/// One review followed by one refine
///
/// If either call fails the original extraction is returned unchanged.
pub async fn review_and_refine(
    gateway: &dyn LlmGateway,
    raw: &RawClaimText,
    extracted: ExtractedClaim,
    validation: &ValidationConfig,
) -> (ExtractedClaim, FeedbackOutcome) {
    let feedback = match review(gateway, raw, &extracted).await {
        Ok(feedback) => feedback,
        Err(e) => {
            warn!("{}: review failed, keeping original: {}", raw.claim_id, e);
            return (extracted, FeedbackOutcome::ReviewFailed);
        }
    };

    debug!(
        "{}: review score {}, {} issues, {} missing",
        raw.claim_id,
        feedback.quality_score,
        feedback.issues.len(),
        feedback.missing_information.len()
    );

    match refine(gateway, raw, &extracted, &feedback, validation).await {
        Ok(refined) => (refined, FeedbackOutcome::Refined),
        Err(e) => {
            warn!("{}: refine failed, keeping original: {}", raw.claim_id, e);
            (extracted, FeedbackOutcome::RefineFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::schema::{EXTRACTION, REVIEW};
    use crate::llm::{ScriptedGateway, ScriptedReply};
    use crate::models::ValidityState;

    fn raws(texts: &[&str]) -> Vec<RawClaimText> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| RawClaimText::new(ClaimId::from_position(i), *t))
            .collect()
    }

    fn complete_extraction() -> serde_json::Value {
        json!({
            "policyholder_name": "John Smith",
            "vehicle": {"make": "Toyota", "model": "Camry", "year": 2018},
            "incident_location": "highway",
            "incident_description": "Rock hit windshield",
            "damage": {"description": "Windshield chip", "location": "windshield"}
        })
    }

    fn review_reply() -> ScriptedReply {
        ScriptedReply::Json(json!({
            "quality_score": 70,
            "issues": [],
            "missing_information": ["incident_date"]
        }))
    }

    #[test]
    fn test_extraction_config_default() {
        let config = ExtractionConfig::default();
        assert!(!config.feedback_loop);
        assert_eq!(config.concurrency, 4);
    }

    #[tokio::test]
    async fn test_one_bad_claim_does_not_fail_batch() {
        let input = raws(&["report one", "report two", "report three"]);
        let gateway = ScriptedGateway::new()
            .on_any(EXTRACTION, ScriptedReply::Json(complete_extraction()))
            .on(
                EXTRACTION,
                &input[1].claim_id,
                ScriptedReply::Text("{not json".into()),
            );

        let batch = extract(&gateway, &input, &ExtractionConfig::default())
            .await
            .unwrap();

        assert_eq!(batch.len(), 3);
        let ids: Vec<ClaimId> = input.iter().map(|r| r.claim_id.clone()).collect();
        assert_eq!(batch.claim_ids(), ids);
        assert_eq!(batch.records[0].validity_state(), ValidityState::Valid);
        assert!(batch.records[1].is_fully_invalid());
        assert!(batch.records[1].extraction_error.is_some());
        assert_eq!(batch.stats.invalid, 1);
        assert_eq!(batch.stats.valid, 2);
    }

    #[tokio::test]
    async fn test_wrong_type_marks_claim_invalid() {
        let input = raws(&["report"]);
        let gateway = ScriptedGateway::new().on_any(
            EXTRACTION,
            ScriptedReply::Json(json!({"policyholder_name": 42})),
        );

        let batch = extract(&gateway, &input, &ExtractionConfig::default())
            .await
            .unwrap();

        assert!(batch.records[0].is_fully_invalid());
    }

    #[tokio::test]
    async fn test_missing_damage_is_flagged() {
        let input = raws(&["Jane Doe called about her Honda Civic, rear-ended at Main St."]);
        let gateway = ScriptedGateway::new().on_any(
            EXTRACTION,
            ScriptedReply::Json(json!({
                "policyholder_name": "Jane Doe",
                "vehicle": {"make": "Honda", "model": "Civic"},
                "incident_description": "Rear-ended",
                "damage": null
            })),
        );

        let batch = extract(&gateway, &input, &ExtractionConfig::default())
            .await
            .unwrap();

        let claim = &batch.records[0];
        assert!(!claim.validity.damage);
        assert!(claim.validity.policyholder);
        assert_eq!(claim.validity_state(), ValidityState::Partial);
    }

    #[tokio::test]
    async fn test_blank_report_skips_model() {
        let input = raws(&["   "]);
        let gateway = ScriptedGateway::new();

        let batch = extract(&gateway, &input, &ExtractionConfig::default())
            .await
            .unwrap();

        assert!(batch.records[0].is_fully_invalid());
        assert_eq!(gateway.call_count(EXTRACTION), 0);
    }

    #[tokio::test]
    async fn test_feedback_loop_disabled_makes_one_call() {
        let input = raws(&["report"]);
        let gateway = ScriptedGateway::new()
            .on_any(EXTRACTION, ScriptedReply::Json(complete_extraction()));

        extract(&gateway, &input, &ExtractionConfig::default())
            .await
            .unwrap();

        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_feedback_loop_refines_once() {
        let input = raws(&["report"]);
        let refined = json!({
            "policyholder_name": "John Smith",
            "vehicle": {"make": "Toyota", "model": "Camry", "year": 2018},
            "incident_date": "2024-01-15",
            "incident_location": "highway",
            "incident_description": "Rock hit windshield",
            "damage": {"description": "Windshield chip", "location": "windshield"}
        });
        let gateway = ScriptedGateway::new()
            .on_any(EXTRACTION, ScriptedReply::Json(complete_extraction()))
            .on_any(EXTRACTION, ScriptedReply::Json(refined))
            .on_any(REVIEW, review_reply());

        let config = ExtractionConfig {
            feedback_loop: true,
            ..Default::default()
        };
        let batch = extract(&gateway, &input, &config).await.unwrap();

        assert_eq!(gateway.calls().len(), 3);
        assert_eq!(gateway.call_count(EXTRACTION), 2);
        assert_eq!(gateway.call_count(REVIEW), 1);
        assert_eq!(batch.records[0].claim_id, input[0].claim_id);
        assert_eq!(batch.records[0].incident_date.as_deref(), Some("2024-01-15"));
        assert_eq!(batch.stats.refined, 1);
    }

    #[tokio::test]
    async fn test_refine_failure_keeps_original() {
        let input = raws(&["report"]);

        let plain = ScriptedGateway::new()
            .on_any(EXTRACTION, ScriptedReply::Json(complete_extraction()));
        let baseline = extract(&plain, &input, &ExtractionConfig::default())
            .await
            .unwrap();

        let gateway = ScriptedGateway::new()
            .on_any(EXTRACTION, ScriptedReply::Json(complete_extraction()))
            .on_any(EXTRACTION, ScriptedReply::TransportFailure)
            .on_any(REVIEW, review_reply());
        let config = ExtractionConfig {
            feedback_loop: true,
            ..Default::default()
        };
        let batch = extract(&gateway, &input, &config).await.unwrap();

        assert_eq!(gateway.call_count(EXTRACTION), 2);
        assert_eq!(batch.records, baseline.records);
        assert_eq!(batch.stats.refine_failed, 1);
        assert_eq!(batch.stats.refined, 0);
    }

    #[tokio::test]
    async fn test_review_failure_keeps_original() {
        let input = raws(&["report"]);
        let gateway = ScriptedGateway::new()
            .on_any(EXTRACTION, ScriptedReply::Json(complete_extraction()))
            .on_any(
                REVIEW,
                ScriptedReply::Json(json!({
                    "quality_score": 250,
                    "issues": [],
                    "missing_information": []
                })),
            );
        let config = ExtractionConfig {
            feedback_loop: true,
            ..Default::default()
        };

        let batch = extract(&gateway, &input, &config).await.unwrap();

        assert_eq!(batch.stats.review_failed, 1);
        assert_eq!(gateway.call_count(EXTRACTION), 1);
        assert_eq!(batch.records[0].validity_state(), ValidityState::Valid);
    }

    #[tokio::test]
    async fn test_failed_extraction_is_not_reviewed() {
        let input = raws(&["report"]);
        let gateway = ScriptedGateway::new()
            .on_any(EXTRACTION, ScriptedReply::Declined)
            .on_any(REVIEW, review_reply());
        let config = ExtractionConfig {
            feedback_loop: true,
            ..Default::default()
        };

        let batch = extract(&gateway, &input, &config).await.unwrap();

        assert!(batch.records[0].is_fully_invalid());
        assert_eq!(gateway.call_count(REVIEW), 0);
    }
}
