use serde::{Deserialize, Serialize};

use super::batch::{ClaimId, ClaimRecord};

/// Upper bound of the review quality score
pub const MAX_QUALITY_SCORE: u32 = 100;

/// Raw shape the model returns when reviewing an extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub quality_score: f64,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub missing_information: Vec<String>,
}

/// Self-review of one extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFeedback {
    pub claim_id: ClaimId,
    /// 0 (unusable) to 100 (complete and accurate)
    pub quality_score: u32,
    pub issues: Vec<String>,
    pub missing_information: Vec<String>,
}

impl ReviewFeedback {
    /// Whether the review found nothing to fix
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.missing_information.is_empty()
    }
}

impl ClaimRecord for ReviewFeedback {
    fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }
}
