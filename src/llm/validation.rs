use thiserror::Error;
use tracing::warn;

use crate::models::{
    AssessmentPayload, ClaimId, ExtractionPayload, MAX_QUALITY_SCORE, ReviewFeedback,
    ReviewPayload, Severity, SeverityAssessment,
};

/// A structured response that failed schema checks
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{schema}: response does not match schema: {message}")]
    Shape {
        schema: &'static str,
        message: String,
    },

    #[error("{field}: {message}")]
    Field {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Field {
            field,
            message: message.into(),
        }
    }
}

/// Bounds applied to extracted values
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub min_vehicle_year: i32,
    pub max_vehicle_year: i32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_vehicle_year: 1900,
            max_vehicle_year: 2100,
        }
    }
}

/// Drop out-of-range values from an extraction payload
///
/// Bad individual values are recorded as absent instead of failing the
/// whole claim, so they show up as missing fields downstream.
pub fn sanitize_extraction(
    claim_id: &ClaimId,
    mut payload: ExtractionPayload,
    config: &ValidationConfig,
) -> ExtractionPayload {
    if let Some(vehicle) = payload.vehicle.as_mut() {
        if let Some(year) = vehicle.year {
            if year < config.min_vehicle_year || year > config.max_vehicle_year {
                warn!("{}: dropping vehicle year {} (out of range)", claim_id, year);
                vehicle.year = None;
            }
        }
    }

    if let Some(damage) = payload.damage.as_mut() {
        if let Some(cost) = damage.estimated_repair_cost {
            if !cost.is_finite() || cost < 0.0 {
                warn!("{}: dropping repair cost {} (must be >= 0)", claim_id, cost);
                damage.estimated_repair_cost = None;
            }
        }
    }

    payload
}

/// Check a review payload and bind it to its claim
pub fn validate_review(
    claim_id: &ClaimId,
    payload: ReviewPayload,
) -> Result<ReviewFeedback, ValidationError> {
    let score = payload.quality_score;
    if !score.is_finite() || score < 0.0 || score > MAX_QUALITY_SCORE as f64 {
        return Err(ValidationError::field(
            "quality_score",
            format!("{} is outside 0-{}", score, MAX_QUALITY_SCORE),
        ));
    }

    Ok(ReviewFeedback {
        claim_id: claim_id.clone(),
        quality_score: score.round() as u32,
        issues: non_blank(payload.issues),
        missing_information: non_blank(payload.missing_information),
    })
}

/// Check an assessment payload and bind it to its claim
pub fn validate_assessment(
    claim_id: &ClaimId,
    payload: AssessmentPayload,
) -> Result<SeverityAssessment, ValidationError> {
    let severity: Severity = payload
        .severity
        .parse()
        .map_err(|e: String| ValidationError::field("severity", e))?;

    let cost = payload.estimated_cost;
    if !cost.is_finite() || cost < 0.0 {
        return Err(ValidationError::field(
            "estimated_cost",
            format!("{} must be a non-negative number", cost),
        ));
    }

    Ok(SeverityAssessment::assessed(
        claim_id.clone(),
        severity,
        cost,
        payload.reasoning.trim(),
    ))
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
