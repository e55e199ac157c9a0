use crate::cli::{ImportArgs, ReportArgs};
use crate::infra::{load_reviews, InMemoryRecordStore};
use hr_review::error::AppError;
use hr_review::reviews::{
    DashboardView, Grade, ParsedImport, Period, ReviewService, RosterQuery, RosterRow,
    SortDirection, SubjectReport,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let parsed = load_reviews(args.csv.as_deref())?;
    let service = ReviewService::new(Arc::new(InMemoryRecordStore::default()));
    service.import(parsed.records)?;

    if let Some(subject) = args.subject.as_deref() {
        let report = service.subject_report(subject)?;
        print!("{}", render_subject(&report));
        return Ok(());
    }

    let query = RosterQuery {
        department: args.department,
        grade: args.grade,
        sort: args.sort.unwrap_or_default(),
        direction: if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    };
    let dashboard = service.dashboard()?;
    let roster = service.roster(&query)?;
    print!("{}", render_overview(&dashboard, &roster));
    Ok(())
}

pub(crate) fn run_import_check(args: ImportArgs) -> Result<(), AppError> {
    let parsed = load_reviews(Some(args.csv.as_path()))?;
    print!("{}", render_import_check(&parsed));
    Ok(())
}

fn score_text(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |value| format!("{value:.1}"))
}

fn grade_text(grade: Option<Grade>) -> &'static str {
    grade.map_or("-", Grade::label)
}

pub(crate) fn render_overview(dashboard: &DashboardView, roster: &[RosterRow]) -> String {
    let kpis = &dashboard.kpis;
    let delta = kpis
        .average_delta
        .map(|delta| format!(", {delta:+.1} vs previous"))
        .unwrap_or_default();
    let mut out = format!(
        "Quarterly review report ({})\n\
         - Headcount {} | average score {}{}\n\
         - A grades {} ({:.0}%) | D grades {}\n",
        kpis.period.label(),
        kpis.headcount,
        score_text(kpis.average_score),
        delta,
        kpis.a_names.len(),
        kpis.a_ratio_pct,
        kpis.d_count
    );
    if !kpis.rising.is_empty() {
        out.push_str(&format!("- Rising: {}\n", kpis.rising.join(", ")));
    }
    if !kpis.high_risk.is_empty() {
        out.push_str(&format!("- High risk: {}\n", kpis.high_risk.join(", ")));
    }

    out.push_str("\nDepartments\n");
    for summary in &dashboard.departments {
        let grades = Grade::ordered()
            .into_iter()
            .map(|grade| format!("{} {}", grade.label(), summary.grades.get(grade)))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "  - {}: {} people | average {} | {}\n",
            summary.department,
            summary.count,
            score_text(summary.average_score),
            grades
        ));
    }

    if roster.is_empty() {
        out.push_str("\nRoster: nobody matches the filters\n");
        return out;
    }

    out.push_str("\nRoster\n");
    for row in roster {
        let rank = row
            .rank
            .map_or_else(|| "-".to_string(), |rank| rank.to_string());
        out.push_str(&format!(
            "  {:>3}. {} ({}, {}) score {} grade {} | trend {} | avg {:.1} | risk {}\n       {}\n",
            rank,
            row.subject_name,
            row.department,
            row.position,
            score_text(row.score),
            grade_text(row.grade),
            row.trend.label(),
            row.average,
            row.risk.label(),
            row.insight
        ));
    }
    out
}

pub(crate) fn render_subject(report: &SubjectReport) -> String {
    let profile = match (report.department.as_deref(), report.position.as_deref()) {
        (Some(department), Some(position)) => format!(" ({department}, {position})"),
        (Some(department), None) => format!(" ({department})"),
        _ => String::new(),
    };
    let mut out = format!("{}{}\n\nHistory\n", report.subject_name, profile);

    for point in &report.history {
        let rank = point
            .rank
            .map(|rank| format!(" #{rank}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {}  {:>5}  {}{}\n",
            point.label,
            score_text(point.score),
            grade_text(point.grade),
            rank
        ));
    }

    out.push_str(&format!(
        "\nTrend {} | average {:.1} | risk {}\nInsight: {}\n",
        report.trend.label(),
        report.average,
        report.risk.label(),
        report.insight
    ));

    if !report.feedback_history.is_empty() {
        out.push_str("\nFeedback\n");
        for entry in &report.feedback_history {
            let comments = [entry.feedback1.as_deref(), entry.feedback2.as_deref()];
            for (evaluator, comment) in comments.into_iter().enumerate() {
                if let Some(comment) = comment {
                    out.push_str(&format!("  {} #{}: {}\n", entry.label, evaluator + 1, comment));
                }
            }
        }
    }
    out
}

pub(crate) fn render_import_check(parsed: &ParsedImport) -> String {
    let mut per_period: BTreeMap<Period, usize> = BTreeMap::new();
    for record in &parsed.records {
        *per_period.entry(record.period).or_default() += 1;
    }

    let mut out = format!("Rows ready to import: {}\n", parsed.records.len());
    for period in Period::ordered() {
        let count = per_period.get(&period).copied().unwrap_or_default();
        out.push_str(&format!("  - {}: {}\n", period.label(), count));
    }

    if parsed.skipped.is_empty() {
        out.push_str("Skipped rows: none\n");
    } else {
        out.push_str("Skipped rows (period not recognised)\n");
        for row in &parsed.skipped {
            out.push_str(&format!(
                "  - line {}: {} \"{}\"\n",
                row.line, row.subject_name, row.period_label
            ));
        }
    }
    out
}
