use super::domain::{EvaluationRecord, RecordKey};

/// Storage abstraction for evaluation records, keyed by subject and period.
///
/// Writers are assumed to be serialized upstream; implementations do not
/// detect concurrent edits.
pub trait RecordStore: Send + Sync {
    /// Snapshot ordered by period, then rank.
    fn list_all(&self) -> Result<Vec<EvaluationRecord>, StoreError>;
    fn insert(&self, record: EvaluationRecord) -> Result<(), StoreError>;
    /// Replaces the record at `key`; the replacement may carry a different key.
    fn update(&self, key: &RecordKey, record: EvaluationRecord) -> Result<(), StoreError>;
    fn upsert(&self, record: EvaluationRecord) -> Result<UpsertOutcome, StoreError>;
    fn delete(&self, key: &RecordKey) -> Result<(), StoreError>;
    /// Removes every record of a subject, returning how many were dropped.
    fn delete_subject(&self, subject_name: &str) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Orders a snapshot the way every store hands it out.
pub fn sort_snapshot(records: &mut [EvaluationRecord]) {
    records.sort_by(|left, right| {
        left.period
            .cmp(&right.period)
            .then_with(|| {
                left.rank
                    .unwrap_or(u32::MAX)
                    .cmp(&right.rank.unwrap_or(u32::MAX))
            })
            .then_with(|| left.subject_name.cmp(&right.subject_name))
    });
}
