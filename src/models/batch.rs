use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a claim within a batch (e.g. `CLAIM-003`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(String);

impl ClaimId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for the claim at a 0-based batch position
    pub fn from_position(index: usize) -> Self {
        Self(format!("CLAIM-{:03}", index + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything produced per claim by a pipeline stage
pub trait ClaimRecord {
    fn claim_id(&self) -> &ClaimId;
}

/// Structural violation between a stage's input and output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchIntegrityError {
    #[error("{stage}: expected {expected} records, found {found}")]
    CountMismatch {
        stage: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{stage}: record {index} has id {found}, expected {expected}")]
    IdMismatch {
        stage: &'static str,
        index: usize,
        expected: ClaimId,
        found: ClaimId,
    },

    #[error("{stage}: duplicate claim id {id}")]
    DuplicateId { stage: &'static str, id: ClaimId },
}

/// Ordered per-claim records of one stage plus aggregate statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult<T, S> {
    pub records: Vec<T>,
    pub stats: S,
}

impl<T: ClaimRecord, S> BatchResult<T, S> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn claim_ids(&self) -> Vec<ClaimId> {
        self.records.iter().map(|r| r.claim_id().clone()).collect()
    }

    pub fn get(&self, id: &ClaimId) -> Option<&T> {
        self.records.iter().find(|r| r.claim_id() == id)
    }

    /// Check that the records match `expected` one-for-one, in order
    pub fn verify_against(
        &self,
        stage: &'static str,
        expected: &[ClaimId],
    ) -> Result<(), BatchIntegrityError> {
        verify_alignment(stage, expected, &self.records)
    }
}

/// Verify that `records` carries exactly the ids in `expected`, in the same
/// order, with no duplicates.
pub fn verify_alignment<T: ClaimRecord>(
    stage: &'static str,
    expected: &[ClaimId],
    records: &[T],
) -> Result<(), BatchIntegrityError> {
    if expected.len() != records.len() {
        return Err(BatchIntegrityError::CountMismatch {
            stage,
            expected: expected.len(),
            found: records.len(),
        });
    }

    let mut seen = HashSet::with_capacity(records.len());
    for (index, (want, record)) in expected.iter().zip(records).enumerate() {
        let found = record.claim_id();
        if !seen.insert(found) {
            return Err(BatchIntegrityError::DuplicateId {
                stage,
                id: found.clone(),
            });
        }
        if want != found {
            return Err(BatchIntegrityError::IdMismatch {
                stage,
                index,
                expected: want.clone(),
                found: found.clone(),
            });
        }
    }

    Ok(())
}
