use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::batch::{ClaimId, ClaimRecord};

/// Damage severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Minor, Severity::Moderate, Severity::Major];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Major => "Major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive; models are inconsistent about capitalisation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Severity::Minor),
            "moderate" => Ok(Severity::Moderate),
            "major" => Ok(Severity::Major),
            other => Err(format!(
                "severity '{}' is not one of Minor, Moderate, Major",
                other
            )),
        }
    }
}

/// Raw shape the model returns for a severity assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPayload {
    pub severity: String,
    pub estimated_cost: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Result of assessing one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssessmentOutcome {
    Assessed {
        severity: Severity,
        estimated_cost: f64,
        reasoning: String,
    },
    /// Not enough descriptive text, or the model output was unusable
    InsufficientInformation { reason: String },
}

/// Stage II record for one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub claim_id: ClaimId,
    pub outcome: AssessmentOutcome,
}

impl SeverityAssessment {
    pub fn assessed(
        claim_id: ClaimId,
        severity: Severity,
        estimated_cost: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            claim_id,
            outcome: AssessmentOutcome::Assessed {
                severity,
                estimated_cost,
                reasoning: reasoning.into(),
            },
        }
    }

    pub fn insufficient(claim_id: ClaimId, reason: impl Into<String>) -> Self {
        Self {
            claim_id,
            outcome: AssessmentOutcome::InsufficientInformation {
                reason: reason.into(),
            },
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match &self.outcome {
            AssessmentOutcome::Assessed { severity, .. } => Some(*severity),
            AssessmentOutcome::InsufficientInformation { .. } => None,
        }
    }

    pub fn estimated_cost(&self) -> Option<f64> {
        match &self.outcome {
            AssessmentOutcome::Assessed { estimated_cost, .. } => Some(*estimated_cost),
            AssessmentOutcome::InsufficientInformation { .. } => None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.severity().is_none()
    }
}

impl ClaimRecord for SeverityAssessment {
    fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }
}

/// Stage II aggregate statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityStats {
    pub by_severity: BTreeMap<Severity, usize>,
    pub insufficient_information: usize,
    /// Sum of estimated costs over assessed claims
    pub total_estimated_cost: f64,
    /// Mean estimated cost over assessed claims, if any were assessed
    pub mean_estimated_cost: Option<f64>,
}

impl SeverityStats {
    pub fn from_assessments(assessments: &[SeverityAssessment]) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut insufficient_information = 0;
        let mut total_estimated_cost = 0.0;
        let mut assessed = 0usize;

        for assessment in assessments {
            match &assessment.outcome {
                AssessmentOutcome::Assessed {
                    severity,
                    estimated_cost,
                    ..
                } => {
                    *by_severity.entry(*severity).or_default() += 1;
                    total_estimated_cost += estimated_cost;
                    assessed += 1;
                }
                AssessmentOutcome::InsufficientInformation { .. } => {
                    insufficient_information += 1;
                }
            }
        }

        Self {
            by_severity,
            insufficient_information,
            total_estimated_cost,
            mean_estimated_cost: (assessed > 0).then(|| total_estimated_cost / assessed as f64),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Major > Severity::Moderate);
        assert!(Severity::Moderate > Severity::Minor);
    }

    #[test]
    fn test_severity_from_str_case_insensitive() {
        assert_eq!("MAJOR".parse::<Severity>(), Ok(Severity::Major));
        assert_eq!(" minor ".parse::<Severity>(), Ok(Severity::Minor));
        assert!("catastrophic".parse::<Severity>().is_err());
    }

    #[test]
    fn test_stats() {
        let assessments = vec![
            SeverityAssessment::assessed(ClaimId::new("A"), Severity::Minor, 500.0, ""),
            SeverityAssessment::assessed(ClaimId::new("B"), Severity::Major, 1500.0, ""),
            SeverityAssessment::insufficient(ClaimId::new("C"), "no damage"),
        ];

        let stats = SeverityStats::from_assessments(&assessments);

        assert_eq!(stats.count(Severity::Minor), 1);
        assert_eq!(stats.count(Severity::Moderate), 0);
        assert_eq!(stats.count(Severity::Major), 1);
        assert_eq!(stats.insufficient_information, 1);
        assert_eq!(stats.total_estimated_cost, 2000.0);
        assert_eq!(stats.mean_estimated_cost, Some(1000.0));
    }

    #[test]
    fn test_stats_empty() {
        let stats = SeverityStats::from_assessments(&[]);
        assert_eq!(stats.mean_estimated_cost, None);
        assert_eq!(stats.total_estimated_cost, 0.0);
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let a = SeverityAssessment::insufficient(ClaimId::new("A"), "no damage");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["outcome"]["status"], "insufficient_information");
    }
}
