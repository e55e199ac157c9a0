use super::aggregates::{
    department_summaries, department_trend, grade_distribution, kpi_summary, period_records,
    DepartmentSummary, DepartmentTrendPoint, GradeDistributionEntry, KpiSummary,
};
use super::domain::{EvaluationRecord, Grade, Period, RiskLevel, Trend};
use super::history::{resolve_history, HistoryEntry, HistoryPointView};
use super::insights::{insight_clauses, InsightClause};
use super::metrics::derive_metrics;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Rank,
    Name,
    Department,
    Position,
    Score,
    Average,
    Grade,
    Trend,
    Risk,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterQuery {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub grade: Option<Grade>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Latest-period record enriched with derived metrics.
#[derive(Debug, Clone, Serialize)]
pub struct RosterRow {
    pub subject_name: String,
    pub department: String,
    pub position: String,
    pub score: Option<f64>,
    pub grade: Option<Grade>,
    pub rank: Option<u32>,
    pub trend: Trend,
    pub average: f64,
    pub risk: RiskLevel,
    pub insight: String,
}

pub fn roster(records: &[EvaluationRecord], query: &RosterQuery) -> Vec<RosterRow> {
    let mut rows: Vec<RosterRow> = period_records(records, Period::latest())
        .into_iter()
        .filter(|record| {
            query
                .department
                .as_deref()
                .map_or(true, |department| record.department == department)
        })
        .filter(|record| query.grade.map_or(true, |grade| record.grade == Some(grade)))
        .map(|record| {
            let metrics = derive_metrics(&resolve_history(&record.subject_name, records));
            RosterRow {
                subject_name: record.subject_name.clone(),
                department: record.department.clone(),
                position: record.position.clone(),
                score: record.score,
                grade: record.grade,
                rank: record.rank,
                trend: metrics.trend,
                average: metrics.average,
                risk: metrics.risk,
                insight: metrics.insight,
            }
        })
        .collect();

    rows.sort_by(|left, right| {
        let ordering = compare_rows(left, right, query.sort);
        match query.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    rows
}

fn compare_rows(left: &RosterRow, right: &RosterRow, key: SortKey) -> Ordering {
    let numeric = |a: Option<f64>, b: Option<f64>| a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0));
    match key {
        SortKey::Rank => numeric(left.rank.map(f64::from), right.rank.map(f64::from)),
        SortKey::Name => left.subject_name.cmp(&right.subject_name),
        SortKey::Department => left.department.cmp(&right.department),
        SortKey::Position => left.position.cmp(&right.position),
        SortKey::Score => numeric(left.score, right.score),
        SortKey::Average => left.average.total_cmp(&right.average),
        SortKey::Grade => grade_text(left.grade).cmp(grade_text(right.grade)),
        SortKey::Trend => left.trend.label().cmp(right.trend.label()),
        SortKey::Risk => left.risk.label().cmp(right.risk.label()),
    }
}

fn grade_text(grade: Option<Grade>) -> &'static str {
    grade.map_or("", Grade::label)
}

/// Evaluator comments from one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    pub period: Period,
    pub label: &'static str,
    pub feedback1: Option<String>,
    pub feedback2: Option<String>,
}

impl FeedbackEntry {
    fn from_entry(entry: &HistoryEntry<'_>) -> Option<Self> {
        let record = entry.record?;
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };
        let feedback1 = text(&record.feedback1);
        let feedback2 = text(&record.feedback2);
        if feedback1.is_none() && feedback2.is_none() {
            return None;
        }
        Some(Self {
            period: entry.period,
            label: entry.period.label(),
            feedback1,
            feedback2,
        })
    }
}

/// Everything the detail view shows for one subject.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub subject_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub history: Vec<HistoryPointView>,
    pub trend: Trend,
    pub average: f64,
    pub risk: RiskLevel,
    pub insight: String,
    pub insight_clauses: Vec<InsightClause>,
    /// Periods with evaluator comments, newest first.
    pub feedback_history: Vec<FeedbackEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<EvaluationRecord>,
}

pub fn subject_report(subject: &str, records: &[EvaluationRecord]) -> SubjectReport {
    let history = resolve_history(subject, records);
    let metrics = derive_metrics(&history);
    let clauses = insight_clauses(&history, metrics.trend, metrics.average, metrics.risk);
    let latest = history.latest_record().cloned();
    let profile = latest.as_ref().or_else(|| {
        history
            .entries()
            .iter()
            .rev()
            .find_map(|entry| entry.record)
    });

    SubjectReport {
        subject_name: subject.to_string(),
        department: profile.map(|record| record.department.clone()),
        position: profile.map(|record| record.position.clone()),
        history: history.points(),
        trend: metrics.trend,
        average: metrics.average,
        risk: metrics.risk,
        insight: metrics.insight,
        insight_clauses: clauses,
        feedback_history: history
            .entries()
            .iter()
            .rev()
            .filter_map(FeedbackEntry::from_entry)
            .collect(),
        latest,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub kpis: KpiSummary,
    pub grade_distribution: Vec<GradeDistributionEntry>,
    pub departments: Vec<DepartmentSummary>,
    pub department_trend: Vec<DepartmentTrendPoint>,
}

pub fn dashboard(records: &[EvaluationRecord]) -> DashboardView {
    DashboardView {
        kpis: kpi_summary(records),
        grade_distribution: grade_distribution(records),
        departments: department_summaries(records),
        department_trend: department_trend(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::tests::common::ranked;

    fn sample() -> Vec<EvaluationRecord> {
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

    #[test]
    fn roster_defaults_to_rank_order() {
        let rows = roster(&sample(), &RosterQuery::default());
        let names: Vec<&str> = rows.iter().map(|row| row.subject_name.as_str()).collect();
        assert_eq!(names, vec!["Ara", "Cy", "Bo"]);
        assert_eq!(rows[0].trend, Trend::Up);
        assert_eq!(rows[2].risk, RiskLevel::High);
    }

    #[test]
    fn roster_filters_by_department_and_grade() {
        let query = RosterQuery {
            department: Some("Ops".to_string()),
            grade: Some(Grade::D),
            ..RosterQuery::default()
        };
        let rows = roster(&sample(), &query);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject_name, "Bo");
    }

    #[test]
    fn roster_sorts_descending_by_score() {
        let query = RosterQuery {
            sort: SortKey::Score,
            direction: SortDirection::Desc,
            ..RosterQuery::default()
        };
        let scores: Vec<Option<f64>> = roster(&sample(), &query)
            .iter()
            .map(|row| row.score)
            .collect();
        assert_eq!(scores, vec![Some(92.0), Some(70.0), Some(52.0)]);
    }

    #[test]
    fn subject_report_includes_aligned_history_and_feedback() {
        let mut records = sample();
        records[1].feedback1 = Some("Led the renewal campaign".to_string());

        let report = subject_report("Ara", &records);
        assert_eq!(report.history.len(), 6);
        assert_eq!(report.history[4].score, Some(80.0));
        assert_eq!(report.history[0].score, None);
        assert_eq!(report.department.as_deref(), Some("Sales"));
        assert_eq!(report.insight_clauses, vec![InsightClause::RisingToTopGrade]);
        assert_eq!(
            report
                .latest
                .as_ref()
                .and_then(|record| record.feedback1.as_deref()),
            Some("Led the renewal campaign")
        );
    }

    #[test]
    fn earlier_feedback_survives_a_silent_current_quarter() {
        let mut records = sample();
        records[0].feedback1 = Some("Q3 coaching note".to_string());
        records[0].feedback2 = Some("  ".to_string());

        let report = subject_report("Ara", &records);
        assert!(report
            .latest
            .as_ref()
            .is_some_and(|record| record.feedback1.is_none()));
        assert_eq!(
            report.feedback_history,
            vec![FeedbackEntry {
                period: Period::Q3Of2025,
                label: "25Q3",
                feedback1: Some("Q3 coaching note".to_string()),
                feedback2: None,
            }]
        );

        let payload = serde_json::to_value(&report).expect("serializes");
        assert_eq!(payload["feedback_history"][0]["label"], "25Q3");
        assert_eq!(
            payload["feedback_history"][0]["feedback1"],
            "Q3 coaching note"
        );
    }

    #[test]
    fn feedback_history_lists_newest_first() {
        let mut records = sample();
        records[0].feedback2 = Some("Steady pipeline".to_string());
        records[1].feedback1 = Some("Led the renewal campaign".to_string());

        let labels: Vec<&str> = subject_report("Ara", &records)
            .feedback_history
            .iter()
            .map(|entry| entry.label)
            .collect();
        assert_eq!(labels, vec!["25Q4", "25Q3"]);
        assert!(subject_report("Cy", &records).feedback_history.is_empty());
    }

    #[test]
    fn dashboard_bundles_every_view() {
        let view = dashboard(&sample());
        assert_eq!(view.kpis.headcount, 3);
        assert_eq!(view.grade_distribution.len(), 6);
        assert_eq!(view.departments.len(), 2);
        assert_eq!(view.department_trend.len(), 6);
    }
}
