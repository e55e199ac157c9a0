use hr_review::error::AppError;
use hr_review::reviews::{
    sort_snapshot, EvaluationRecord, Grade, ParsedImport, RecordKey, RecordStore, SortKey,
    SpreadsheetImporter, StoreError, UpsertOutcome,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

const SAMPLE_REVIEWS: &str = include_str!("../data/sample_reviews.csv");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local record store; contents live as long as the server.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRecordStore {
    records: Arc<Mutex<BTreeMap<RecordKey, EvaluationRecord>>>,
}

impl InMemoryRecordStore {
    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("record store mutex poisoned").len()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn list_all(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        let guard = self.records.lock().expect("record store mutex poisoned");
        let mut records: Vec<EvaluationRecord> = guard.values().cloned().collect();
        sort_snapshot(&mut records);
        Ok(records)
    }

    fn insert(&self, record: EvaluationRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("record store mutex poisoned");
        let key = record.key();
        if guard.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        guard.insert(key, record);
        Ok(())
    }

    fn update(&self, key: &RecordKey, record: EvaluationRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("record store mutex poisoned");
        if !guard.contains_key(key) {
            return Err(StoreError::NotFound);
        }
        let new_key = record.key();
        if &new_key != key && guard.contains_key(&new_key) {
            return Err(StoreError::Conflict);
        }
        guard.remove(key);
        guard.insert(new_key, record);
        Ok(())
    }

    fn upsert(&self, record: EvaluationRecord) -> Result<UpsertOutcome, StoreError> {
        let mut guard = self.records.lock().expect("record store mutex poisoned");
        Ok(match guard.insert(record.key(), record) {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Inserted,
        })
    }

    fn delete(&self, key: &RecordKey) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("record store mutex poisoned");
        guard.remove(key).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn delete_subject(&self, subject_name: &str) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("record store mutex poisoned");
        let before = guard.len();
        guard.retain(|key, _| key.subject_name != subject_name);
        Ok(before - guard.len())
    }
}

/// Bundled synthetic dataset used by `--sample` and the CLI reports.
pub(crate) fn sample_reviews() -> Result<ParsedImport, AppError> {
    Ok(SpreadsheetImporter::from_reader(SAMPLE_REVIEWS.as_bytes())?)
}

/// Reads an export from disk, or the bundled sample when no path is given.
pub(crate) fn load_reviews(csv: Option<&Path>) -> Result<ParsedImport, AppError> {
    match csv {
        Some(path) => {
            info!(path = %path.display(), "loading evaluation export");
            Ok(SpreadsheetImporter::from_path(path)?)
        }
        None => sample_reviews(),
    }
}

pub(crate) fn parse_grade(raw: &str) -> Result<Grade, String> {
    Grade::parse(raw).ok_or_else(|| format!("'{raw}' is not a grade; use A, B, C, or D"))
}

pub(crate) fn parse_sort_key(raw: &str) -> Result<SortKey, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase()))
        .map_err(|_| {
            format!(
                "'{raw}' is not a sort column; use rank, name, department, position, score, \
                 average, grade, trend, or risk"
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_review::reviews::Period;

    #[test]
    fn bundled_sample_covers_every_period() {
        let parsed = sample_reviews().expect("sample parses");
        assert!(parsed.skipped.is_empty());
        for period in Period::ordered() {
            assert!(
                parsed.records.iter().any(|record| record.period == period),
                "{period} missing from sample"
            );
        }
    }

    #[test]
    fn store_round_trips_upserts_and_deletes() {
        let store = InMemoryRecordStore::default();
        let parsed = sample_reviews().expect("sample parses");
        let first = parsed.records[0].clone();

        assert_eq!(
            store.upsert(first.clone()).expect("upsert"),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert(first.clone()).expect("upsert"),
            UpsertOutcome::Replaced
        );
        assert!(matches!(
            store.insert(first.clone()),
            Err(StoreError::Conflict)
        ));
        assert_eq!(store.len(), 1);

        store.delete(&first.key()).expect("delete");
        assert!(matches!(store.delete(&first.key()), Err(StoreError::NotFound)));
    }

    #[test]
    fn cli_value_parsers_accept_known_values() {
        assert_eq!(parse_grade("b"), Ok(Grade::B));
        assert!(parse_grade("E").is_err());
        assert_eq!(parse_sort_key("Score"), Ok(SortKey::Score));
        assert!(parse_sort_key("salary").is_err());
    }
}
