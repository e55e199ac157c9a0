use super::domain::{EvaluationRecord, Grade, Period, RiskLevel, Trend};
use super::history::resolve_history;
use super::metrics::{mean, risk, trend};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
}

impl GradeCounts {
    pub fn tally<I>(grades: I) -> Self
    where
        I: IntoIterator<Item = Option<Grade>>,
    {
        let mut counts = Self::default();
        for grade in grades.into_iter().flatten() {
            match grade {
                Grade::A => counts.a += 1,
                Grade::B => counts.b += 1,
                Grade::C => counts.c += 1,
                Grade::D => counts.d += 1,
            }
        }
        counts
    }

    pub fn get(&self, grade: Grade) -> usize {
        match grade {
            Grade::A => self.a,
            Grade::B => self.b,
            Grade::C => self.c,
            Grade::D => self.d,
        }
    }

    pub fn graded(&self) -> usize {
        self.a + self.b + self.c + self.d
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeDistributionEntry {
    pub period: Period,
    pub label: &'static str,
    #[serde(flatten)]
    pub counts: GradeCounts,
    pub total: usize,
}

/// Grade counts for every defined period, across all subjects.
pub fn grade_distribution(records: &[EvaluationRecord]) -> Vec<GradeDistributionEntry> {
    Period::ordered()
        .into_iter()
        .map(|period| {
            let in_period: Vec<&EvaluationRecord> = records
                .iter()
                .filter(|record| record.period == period)
                .collect();
            GradeDistributionEntry {
                period,
                label: period.label(),
                counts: GradeCounts::tally(in_period.iter().map(|record| record.grade)),
                total: in_period.len(),
            }
        })
        .collect()
}

/// Records of one period ordered by rank; unranked records go last.
pub fn period_records(records: &[EvaluationRecord], period: Period) -> Vec<&EvaluationRecord> {
    let mut selected: Vec<&EvaluationRecord> = records
        .iter()
        .filter(|record| record.period == period)
        .collect();
    selected.sort_by_key(|record| record.rank.unwrap_or(u32::MAX));
    selected
}

/// Departments of the latest period, in order of first appearance by rank.
pub fn departments(records: &[EvaluationRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in period_records(records, Period::latest()) {
        if !names.contains(&record.department) {
            names.push(record.department.clone());
        }
    }
    names
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentMember {
    pub name: String,
    pub grade: Option<Grade>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentSummary {
    pub department: String,
    pub count: usize,
    pub average_score: Option<f64>,
    #[serde(flatten)]
    pub grades: GradeCounts,
    pub members: Vec<DepartmentMember>,
}

/// Latest-period headcount, mean score, and grade mix per department.
pub fn department_summaries(records: &[EvaluationRecord]) -> Vec<DepartmentSummary> {
    let latest = period_records(records, Period::latest());
    departments(records)
        .into_iter()
        .map(|department| {
            let members: Vec<&EvaluationRecord> = latest
                .iter()
                .copied()
                .filter(|record| record.department == department)
                .collect();
            let scores: Vec<f64> = members.iter().filter_map(|record| record.score).collect();

            DepartmentSummary {
                count: members.len(),
                average_score: mean(&scores),
                grades: GradeCounts::tally(members.iter().map(|record| record.grade)),
                members: members
                    .iter()
                    .map(|record| DepartmentMember {
                        name: record.subject_name.clone(),
                        grade: record.grade,
                        score: record.score,
                    })
                    .collect(),
                department,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentAverage {
    pub department: String,
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentTrendPoint {
    pub period: Period,
    pub label: &'static str,
    pub departments: Vec<DepartmentAverage>,
}

/// Mean score for every (department, period) pair; `None` where a department had no scores.
pub fn department_trend(records: &[EvaluationRecord]) -> Vec<DepartmentTrendPoint> {
    let names = departments(records);
    Period::ordered()
        .into_iter()
        .map(|period| DepartmentTrendPoint {
            period,
            label: period.label(),
            departments: names
                .iter()
                .map(|department| {
                    let scores: Vec<f64> = records
                        .iter()
                        .filter(|record| {
                            record.period == period && &record.department == department
                        })
                        .filter_map(|record| record.score)
                        .collect();
                    DepartmentAverage {
                        department: department.clone(),
                        average_score: mean(&scores),
                    }
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    pub period: Period,
    pub headcount: usize,
    pub average_score: Option<f64>,
    pub previous_average_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_delta: Option<f64>,
    pub a_count: usize,
    pub a_ratio_pct: f64,
    pub a_names: Vec<String>,
    pub d_count: usize,
    pub rising: Vec<String>,
    pub high_risk: Vec<String>,
}

/// Headline numbers for the latest period compared with the one before it.
pub fn kpi_summary(records: &[EvaluationRecord]) -> KpiSummary {
    let period = Period::latest();
    let latest = period_records(records, period);
    let period_average = |period: Period| {
        let scores: Vec<f64> = records
            .iter()
            .filter(|record| record.period == period)
            .filter_map(|record| record.score)
            .collect();
        mean(&scores)
    };

    let average_score = period_average(period);
    let previous_average_score = period.previous().and_then(period_average);
    let a_names = names_where(&latest, |record| record.grade == Some(Grade::A));
    let d_count = names_where(&latest, |record| record.grade == Some(Grade::D)).len();
    let rising = names_where(&latest, |record| {
        trend(&resolve_history(&record.subject_name, records)) == Trend::Up
    });
    let high_risk = names_where(&latest, |record| {
        risk(&resolve_history(&record.subject_name, records)) == RiskLevel::High
    });

    let headcount = latest.len();
    let a_ratio_pct = if headcount == 0 {
        0.0
    } else {
        (a_names.len() as f64 / headcount as f64 * 100.0).round()
    };

    KpiSummary {
        period,
        headcount,
        average_score,
        previous_average_score,
        average_delta: average_score
            .zip(previous_average_score)
            .map(|(current, previous)| current - previous),
        a_count: a_names.len(),
        a_ratio_pct,
        a_names,
        d_count,
        rising,
        high_risk,
    }
}

fn names_where(
    records: &[&EvaluationRecord],
    predicate: impl Fn(&EvaluationRecord) -> bool,
) -> Vec<String> {
    records
        .iter()
        .filter(|record| predicate(**record))
        .map(|record| record.subject_name.clone())
        .collect()
}
