use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{EvaluationRecord, RecordKey};
use super::history::resolve_history;
use super::store::{RecordStore, StoreError, UpsertOutcome};
use super::views::{self, DashboardView, RosterQuery, RosterRow, SubjectReport};
use serde::Serialize;

/// Service composing the record store with the derived views.
///
/// Every read recomputes from a fresh snapshot; nothing is cached.
pub struct ReviewService<S> {
    store: Arc<S>,
}

impl<S> ReviewService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn records(&self) -> Result<Vec<EvaluationRecord>, ReviewServiceError> {
        Ok(self.store.list_all()?)
    }

    pub fn subject_report(&self, subject: &str) -> Result<SubjectReport, ReviewServiceError> {
        let records = self.store.list_all()?;
        if !resolve_history(subject, &records).has_records() {
            return Err(ReviewServiceError::SubjectNotFound(subject.to_string()));
        }
        debug!(subject, "building subject report");
        Ok(views::subject_report(subject, &records))
    }

    pub fn roster(&self, query: &RosterQuery) -> Result<Vec<RosterRow>, ReviewServiceError> {
        let records = self.store.list_all()?;
        Ok(views::roster(&records, query))
    }

    pub fn dashboard(&self) -> Result<DashboardView, ReviewServiceError> {
        let records = self.store.list_all()?;
        debug!(records = records.len(), "building dashboard");
        Ok(views::dashboard(&records))
    }

    pub fn add_record(
        &self,
        draft: EvaluationRecord,
    ) -> Result<EvaluationRecord, ReviewServiceError> {
        let record = validate(draft)?;
        self.store.insert(record.clone())?;
        info!(key = %record.key(), "evaluation record added");
        Ok(record)
    }

    pub fn update_record(
        &self,
        key: &RecordKey,
        draft: EvaluationRecord,
    ) -> Result<EvaluationRecord, ReviewServiceError> {
        let record = validate(draft)?;
        self.store.update(key, record.clone())?;
        info!(%key, new_key = %record.key(), "evaluation record updated");
        Ok(record)
    }

    pub fn delete_record(&self, key: &RecordKey) -> Result<(), ReviewServiceError> {
        self.store.delete(key)?;
        info!(%key, "evaluation record deleted");
        Ok(())
    }

    pub fn delete_subject(&self, subject: &str) -> Result<usize, ReviewServiceError> {
        let removed = self.store.delete_subject(subject)?;
        if removed == 0 {
            return Err(ReviewServiceError::SubjectNotFound(subject.to_string()));
        }
        info!(subject, removed, "subject and evaluations deleted");
        Ok(removed)
    }

    /// Writes rows one by one, last write wins per subject and period.
    ///
    /// A failure part-way leaves earlier rows applied.
    pub fn import(
        &self,
        rows: Vec<EvaluationRecord>,
    ) -> Result<ImportReport, ReviewServiceError> {
        if rows.is_empty() {
            return Err(ReviewServiceError::NothingToImport);
        }

        let mut report = ImportReport::default();
        for row in rows {
            let record = validate(row)?;
            match self.store.upsert(record) {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Replaced) => report.replaced += 1,
                Err(err) => {
                    warn!(
                        applied = report.inserted + report.replaced,
                        error = %err,
                        "import interrupted"
                    );
                    return Err(err.into());
                }
            }
        }

        info!(
            inserted = report.inserted,
            replaced = report.replaced,
            "evaluation import applied"
        );
        Ok(report)
    }
}

fn validate(draft: EvaluationRecord) -> Result<EvaluationRecord, ReviewServiceError> {
    let record = draft.normalized();
    if record.subject_name.is_empty() {
        return Err(ReviewServiceError::Validation(
            "subject name must not be empty".to_string(),
        ));
    }
    Ok(record)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub replaced: usize,
}

impl ImportReport {
    pub fn applied(&self) -> usize {
        self.inserted + self.replaced
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error("invalid evaluation record: {0}")]
    Validation(String),
    #[error("no evaluations found for {0}")]
    SubjectNotFound(String),
    #[error("there is no data to import")]
    NothingToImport,
    #[error(transparent)]
    Store(#[from] StoreError),
}
