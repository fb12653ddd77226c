use tracing::{debug, info};

use crate::heuristics::{DamageKeywords, is_glass_only};
use crate::models::{
    BatchIntegrityError, BatchResult, ClaimId, ExtractedClaim, Priority, Queue, QueueAssignment,
    RoutingReason, RoutingStats, Severity, SeverityAssessment, verify_alignment,
};

pub const ROUTING_STAGE: &str = "routing";

/// Configuration for Stage III
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Word lists for glass-only detection
    pub keywords: DamageKeywords,
    /// Moderate claims estimated at or above this move up one priority
    pub escalation_cost: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            keywords: DamageKeywords::default(),
            escalation_cost: 3000.0,
        }
    }
}

/// Execute Stage III: queue routing and priority assignment
///
/// Deterministic; no model call. Queue floor:
/// - Major → total_loss
/// - Moderate → material_damage
/// - Minor, glass-only damage → glass
/// - Minor otherwise → fast_track
///
/// Claims whose extraction failed outright are escalated to total_loss at
/// priority 1 for manual handling. A successful extraction that found no
/// required field is routed on its assessment like any other claim.
pub fn route(
    claims: &[ExtractedClaim],
    severities: &[SeverityAssessment],
    config: &RoutingConfig,
) -> Result<BatchResult<QueueAssignment, RoutingStats>, BatchIntegrityError> {
    let expected: Vec<ClaimId> = claims.iter().map(|c| c.claim_id.clone()).collect();
    verify_alignment(ROUTING_STAGE, &expected, severities)?;

    info!("Stage III: Routing {} claims", claims.len());

    let records: Vec<QueueAssignment> = claims
        .iter()
        .zip(severities)
        .map(|(claim, assessment)| route_claim(claim, assessment, config))
        .collect();

    let stats = RoutingStats::from_assignments(&records);
    info!(
        "Stage III: glass={}, fast_track={}, material_damage={}, total_loss={}",
        stats.queue_count(Queue::Glass),
        stats.queue_count(Queue::FastTrack),
        stats.queue_count(Queue::MaterialDamage),
        stats.queue_count(Queue::TotalLoss)
    );

    Ok(BatchResult { records, stats })
}

/// Route a single claim
pub fn route_claim(
    claim: &ExtractedClaim,
    assessment: &SeverityAssessment,
    config: &RoutingConfig,
) -> QueueAssignment {
    let (queue, priority, reason) = if claim.extraction_failed() {
        (Queue::TotalLoss, Priority::HIGHEST, RoutingReason::InvalidExtraction)
    } else {
        match assessment.severity() {
            Some(Severity::Major) => (
                Queue::TotalLoss,
                Priority::HIGHEST,
                RoutingReason::MajorSeverity,
            ),
            Some(Severity::Moderate) if is_escalated(claim, assessment, config) => (
                Queue::MaterialDamage,
                Priority::HIGH,
                RoutingReason::ModerateEscalated,
            ),
            Some(Severity::Moderate) => (
                Queue::MaterialDamage,
                Priority::MEDIUM,
                RoutingReason::ModerateSeverity,
            ),
            None => (
                Queue::FastTrack,
                Priority::MEDIUM,
                RoutingReason::InsufficientInformation,
            ),
            Some(Severity::Minor) if has_glass_only_damage(claim, &config.keywords) => {
                (Queue::Glass, Priority::LOWEST, RoutingReason::MinorGlassOnly)
            }
            Some(Severity::Minor) => {
                (Queue::FastTrack, Priority::LOW, RoutingReason::MinorSeverity)
            }
        }
    };

    debug!("{}: {} (priority {}, {:?})", claim.claim_id, queue, priority, reason);

    QueueAssignment {
        claim_id: claim.claim_id.clone(),
        queue,
        priority,
        reason,
    }
}

/// Glass-only check over the damage description and damage area
fn has_glass_only_damage(claim: &ExtractedClaim, keywords: &DamageKeywords) -> bool {
    let text = [claim.damage_description(), claim.damage_location()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    is_glass_only(&text, keywords)
}

fn is_escalated(
    claim: &ExtractedClaim,
    assessment: &SeverityAssessment,
    config: &RoutingConfig,
) -> bool {
    claim.other_parties_involved == Some(true)
        || claim.police_report_filed == Some(true)
        || assessment
            .estimated_cost()
            .is_some_and(|cost| cost >= config.escalation_cost)
}
