use super::domain::{EvaluationRecord, Grade, Period};
use serde::Serialize;

/// A subject's record for one period, or a placeholder when none exists.
#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry<'a> {
    pub period: Period,
    pub record: Option<&'a EvaluationRecord>,
}

impl<'a> HistoryEntry<'a> {
    pub fn score(&self) -> Option<f64> {
        self.record.and_then(|record| record.score)
    }

    pub fn grade(&self) -> Option<Grade> {
        self.record.and_then(|record| record.grade)
    }

    pub fn rank(&self) -> Option<u32> {
        self.record.and_then(|record| record.rank)
    }

    pub fn to_view(&self) -> HistoryPointView {
        HistoryPointView {
            period: self.period,
            label: self.period.label(),
            score: self.score(),
            grade: self.grade(),
            rank: self.rank(),
        }
    }
}

/// A history entry known to carry a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPoint {
    pub period: Period,
    pub score: f64,
    pub grade: Option<Grade>,
}

/// Period-aligned history of one subject.
#[derive(Debug, Clone)]
pub struct SubjectHistory<'a> {
    subject: &'a str,
    entries: Vec<HistoryEntry<'a>>,
}

impl<'a> SubjectHistory<'a> {
    pub fn subject(&self) -> &'a str {
        self.subject
    }

    pub fn entries(&self) -> &[HistoryEntry<'a>] {
        &self.entries
    }

    /// Entries with a score, chronological; empty periods are skipped.
    pub fn scored(&self) -> Vec<ScoredPoint> {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry.score().map(|score| ScoredPoint {
                    period: entry.period,
                    score,
                    grade: entry.grade(),
                })
            })
            .collect()
    }

    /// Record for the current reporting cycle, if the subject has one.
    pub fn latest_record(&self) -> Option<&'a EvaluationRecord> {
        self.entries
            .iter()
            .find(|entry| entry.period == Period::latest())
            .and_then(|entry| entry.record)
    }

    pub fn has_records(&self) -> bool {
        self.entries.iter().any(|entry| entry.record.is_some())
    }

    pub fn points(&self) -> Vec<HistoryPointView> {
        self.entries.iter().map(HistoryEntry::to_view).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPointView {
    pub period: Period,
    pub label: &'static str,
    pub score: Option<f64>,
    pub grade: Option<Grade>,
    pub rank: Option<u32>,
}

/// Aligns a subject's records with the fixed period list (exact name match).
pub fn resolve_history<'a>(subject: &'a str, records: &'a [EvaluationRecord]) -> SubjectHistory<'a> {
    let entries = Period::ordered()
        .into_iter()
        .map(|period| HistoryEntry {
            period,
            record: records
                .iter()
                .find(|record| record.period == period && record.subject_name == subject),
        })
        .collect();

    SubjectHistory { subject, entries }
}
