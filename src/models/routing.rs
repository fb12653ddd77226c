use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::batch::{ClaimId, ClaimRecord};

/// Downstream handling queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Queue {
    Glass,
    FastTrack,
    MaterialDamage,
    TotalLoss,
}

impl Queue {
    pub const ALL: [Queue; 4] = [
        Queue::Glass,
        Queue::FastTrack,
        Queue::MaterialDamage,
        Queue::TotalLoss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::Glass => "glass",
            Queue::FastTrack => "fast_track",
            Queue::MaterialDamage => "material_damage",
            Queue::TotalLoss => "total_loss",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Urgency from 1 (highest) to 5 (lowest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const HIGH: Priority = Priority(2);
    pub const MEDIUM: Priority = Priority(3);
    pub const LOW: Priority = Priority(4);
    pub const LOWEST: Priority = Priority(5);

    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Priority> {
        (1..=5).map(Priority)
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Priority::new(value).ok_or_else(|| format!("priority {} is outside 1-5", value))
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which routing rule placed the claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingReason {
    /// Extraction failed outright; needs manual handling
    InvalidExtraction,
    MajorSeverity,
    /// Moderate damage with third parties, a police report or a high estimate
    ModerateEscalated,
    ModerateSeverity,
    /// Assessment could not be made from the extracted fields
    InsufficientInformation,
    MinorGlassOnly,
    MinorSeverity,
}

/// Stage III record for one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueAssignment {
    pub claim_id: ClaimId,
    pub queue: Queue,
    pub priority: Priority,
    pub reason: RoutingReason,
}

impl ClaimRecord for QueueAssignment {
    fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }
}

/// Stage III aggregate statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub by_queue: BTreeMap<Queue, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
}

impl RoutingStats {
    pub fn from_assignments(assignments: &[QueueAssignment]) -> Self {
        let mut by_queue: BTreeMap<Queue, usize> = Queue::ALL.iter().map(|q| (*q, 0)).collect();
        let mut by_priority: BTreeMap<Priority, usize> = Priority::all().map(|p| (p, 0)).collect();

        for assignment in assignments {
            *by_queue.entry(assignment.queue).or_default() += 1;
            *by_priority.entry(assignment.priority).or_default() += 1;
        }

        Self {
            by_queue,
            by_priority,
        }
    }

    pub fn queue_count(&self, queue: Queue) -> usize {
        self.by_queue.get(&queue).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: u8) -> usize {
        Priority::new(priority)
            .and_then(|p| self.by_priority.get(&p).copied())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bounds() {
        assert!(Priority::new(0).is_none());
        assert!(Priority::new(6).is_none());
        assert_eq!(Priority::new(3).map(|p| p.value()), Some(3));
    }

    #[test]
    fn test_named_priorities_cover_scale() {
        let named = [
            Priority::HIGHEST,
            Priority::HIGH,
            Priority::MEDIUM,
            Priority::LOW,
            Priority::LOWEST,
        ];
        assert_eq!(named.to_vec(), Priority::all().collect::<Vec<_>>());
    }

    #[test]
    fn test_priority_rejects_out_of_range_json() {
        assert!(serde_json::from_str::<Priority>("7").is_err());
        assert_eq!(serde_json::from_str::<Priority>("2").unwrap().value(), 2);
    }

    #[test]
    fn test_queue_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Queue::MaterialDamage).unwrap(),
            "\"material_damage\""
        );
    }

    #[test]
    fn test_routing_stats() {
        let assignments = vec![
            QueueAssignment {
                claim_id: ClaimId::new("A"),
                queue: Queue::Glass,
                priority: Priority::LOWEST,
                reason: RoutingReason::MinorGlassOnly,
            },
            QueueAssignment {
                claim_id: ClaimId::new("B"),
                queue: Queue::TotalLoss,
                priority: Priority::HIGHEST,
                reason: RoutingReason::MajorSeverity,
            },
        ];

        let stats = RoutingStats::from_assignments(&assignments);

        assert_eq!(stats.queue_count(Queue::Glass), 1);
        assert_eq!(stats.queue_count(Queue::FastTrack), 0);
        assert_eq!(stats.queue_count(Queue::TotalLoss), 1);
        assert_eq!(stats.priority_count(1), 1);
        assert_eq!(stats.priority_count(5), 1);
        assert_eq!(stats.by_priority.len(), 5);
    }
}
