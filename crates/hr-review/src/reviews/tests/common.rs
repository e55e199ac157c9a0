use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use axum::Router;
use serde_json::Value;

use crate::config::AiApiConfig;
use crate::reviews::domain::{EvaluationRecord, Grade, Period, RecordKey};
use crate::reviews::narrative::{GenerationError, GenerationRequest, NarrativeService, TextGenerator};
use crate::reviews::router::review_router;
use crate::reviews::service::ReviewService;
use crate::reviews::store::{sort_snapshot, RecordStore, StoreError, UpsertOutcome};

pub(crate) fn record(name: &str, period: Period, score: f64, grade: &str) -> EvaluationRecord {
    EvaluationRecord {
        period,
        subject_name: name.to_string(),
        department: "Operations".to_string(),
        position: "GR2".to_string(),
        evaluator1: "Team Lead".to_string(),
        evaluator2: None,
        method: "absolute".to_string(),
        score: Some(score),
        grade: Grade::parse(grade),
        rank: None,
        feedback1: None,
        feedback2: None,
    }
}

pub(crate) fn ranked(
    name: &str,
    department: &str,
    period: Period,
    score: f64,
    grade: &str,
    rank: u32,
) -> EvaluationRecord {
    EvaluationRecord {
        department: department.to_string(),
        rank: Some(rank),
        ..record(name, period, score, grade)
    }
}

/// Consecutive periods starting at the first defined quarter.
pub(crate) fn series(name: &str, points: &[(f64, &str)]) -> Vec<EvaluationRecord> {
    Period::ordered()
        .into_iter()
        .zip(points)
        .map(|(period, (score, grade))| record(name, period, *score, grade))
        .collect()
}

#[derive(Default, Clone)]
pub(crate) struct MemoryStore {
    pub(crate) records: Arc<Mutex<BTreeMap<RecordKey, EvaluationRecord>>>,
}

impl MemoryStore {
    pub(crate) fn seeded(records: Vec<EvaluationRecord>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.records.lock().expect("store mutex poisoned");
            for record in records {
                guard.insert(record.key(), record);
            }
        }
        store
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }
}

impl RecordStore for MemoryStore {
    fn list_all(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut records: Vec<EvaluationRecord> = guard.values().cloned().collect();
        sort_snapshot(&mut records);
        Ok(records)
    }

    fn insert(&self, record: EvaluationRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let key = record.key();
        if guard.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        guard.insert(key, record);
        Ok(())
    }

    fn update(&self, key: &RecordKey, record: EvaluationRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
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
        let mut guard = self.records.lock().expect("store mutex poisoned");
        match guard.insert(record.key(), record) {
            Some(_) => Ok(UpsertOutcome::Replaced),
            None => Ok(UpsertOutcome::Inserted),
        }
    }

    fn delete(&self, key: &RecordKey) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.remove(key).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn delete_subject(&self, subject_name: &str) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let before = guard.len();
        guard.retain(|key, _| key.subject_name != subject_name);
        Ok(before - guard.len())
    }
}

/// Accepts a fixed number of writes, then reports the backend as gone.
pub(crate) struct FlakyStore {
    pub(crate) inner: MemoryStore,
    pub(crate) writes_left: Mutex<usize>,
}

impl FlakyStore {
    pub(crate) fn failing_after(writes: usize) -> Self {
        Self {
            inner: MemoryStore::default(),
            writes_left: Mutex::new(writes),
        }
    }

    fn spend_write(&self) -> Result<(), StoreError> {
        let mut left = self.writes_left.lock().expect("flaky mutex poisoned");
        if *left == 0 {
            return Err(StoreError::Unavailable("database offline".to_string()));
        }
        *left -= 1;
        Ok(())
    }
}

impl RecordStore for FlakyStore {
    fn list_all(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        self.inner.list_all()
    }

    fn insert(&self, record: EvaluationRecord) -> Result<(), StoreError> {
        self.spend_write()?;
        self.inner.insert(record)
    }

    fn update(&self, key: &RecordKey, record: EvaluationRecord) -> Result<(), StoreError> {
        self.spend_write()?;
        self.inner.update(key, record)
    }

    fn upsert(&self, record: EvaluationRecord) -> Result<UpsertOutcome, StoreError> {
        self.spend_write()?;
        self.inner.upsert(record)
    }

    fn delete(&self, key: &RecordKey) -> Result<(), StoreError> {
        self.spend_write()?;
        self.inner.delete(key)
    }

    fn delete_subject(&self, subject_name: &str) -> Result<usize, StoreError> {
        self.spend_write()?;
        self.inner.delete_subject(subject_name)
    }
}

/// Returns the prompt's first line so tests can see what was asked.
pub(crate) struct EchoGenerator;

impl TextGenerator for EchoGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        request
            .prompt
            .lines()
            .next()
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }
}

pub(crate) fn sample_records() -> Vec<EvaluationRecord> {
    let latest = Period::latest();
    let previous = Period::Q3Of2025;
    vec![
        ranked("Ara", "Sales", previous, 80.0, "B", 1),
        ranked("Ara", "Sales", latest, 92.0, "A", 1),
        ranked("Bo", "Ops", previous, 75.0, "B", 2),
        ranked("Bo", "Ops", latest, 52.0, "D", 3),
        ranked("Cy", "Ops", latest, 70.0, "C", 2),
    ]
}

pub(crate) fn build_router(store: MemoryStore, ai: AiApiConfig) -> Router {
    let reviews = Arc::new(ReviewService::new(Arc::new(store)));
    let narrative = Arc::new(NarrativeService::new(Arc::new(EchoGenerator), ai));
    review_router(reviews, narrative)
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
