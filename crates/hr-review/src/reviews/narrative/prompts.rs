use crate::reviews::aggregates::DepartmentSummary;
use crate::reviews::domain::{EvaluationRecord, Grade, Period};
use crate::reviews::history::SubjectHistory;
use serde_json::json;

fn score_text(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |score| format!("{score}"))
}

fn grade_text(grade: Option<Grade>) -> &'static str {
    grade.map_or("n/a", Grade::label)
}

fn feedback_text(feedback: Option<&str>) -> &str {
    feedback.unwrap_or("none")
}

/// Growth-oriented coaching report for one employee.
pub fn employee_report_prompt(history: &SubjectHistory<'_>, latest: &EvaluationRecord) -> String {
    let trajectory: Vec<serde_json::Value> = history
        .scored()
        .iter()
        .map(|point| {
            json!({
                "quarter": point.period.label(),
                "score": point.score,
                "grade": point.grade.map(Grade::label),
            })
        })
        .collect();
    let trajectory = serde_json::Value::Array(trajectory).to_string();

    format!(
        "You are an HR expert and performance coach with twenty years of experience. \
Write a growth-focused feedback report for the employee below.

[Employee]
Name: {name}, Department: {department}, Position: {position}
{quarter} result: score {score}, grade {grade}

[Performance history]
{trajectory}

[Latest evaluator feedback]
First evaluator: {first}
Second evaluator: {second}

[Requests]
1. Key strengths: summarize two strengths visible in the data and feedback.
2. Improvement area: one concrete weakness to address for growth.
3. Action plan: three concrete steps to improve next quarter.

Tone: professional and objective, yet warm and encouraging of growth.",
        name = latest.subject_name,
        department = latest.department,
        position = latest.position,
        quarter = latest.period.label(),
        score = score_text(latest.score),
        grade = grade_text(latest.grade),
        first = feedback_text(latest.feedback1.as_deref()),
        second = feedback_text(latest.feedback2.as_deref()),
    )
}

/// Draft of the quarterly result email sent to the employee.
pub fn feedback_email_prompt(latest: &EvaluationRecord) -> String {
    let feedback = [latest.feedback1.as_deref(), latest.feedback2.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "You are the head of HR. Draft an email to {name} with their {quarter} evaluation result and feedback.

[Result]
Score: {score}, Grade: {grade}

[Key feedback]
{feedback}

[Guide]
- Subject: [Performance Review] {quarter} evaluation result and feedback
- Opening: thank them for their work.
- Body: state the grade and summarize the feedback, acknowledging strengths and naming areas to improve.
- Closing: expectations for next quarter and an invitation to a one-on-one.
- Very polite, encouraging business email format.",
        name = latest.subject_name,
        quarter = quarter_title(latest.period),
        score = score_text(latest.score),
        grade = grade_text(latest.grade),
        feedback = if feedback.is_empty() { "none" } else { feedback.as_str() },
    )
}

/// Executive briefing on one department's current quarter.
pub fn department_briefing_prompt(summary: &DepartmentSummary, period: Period) -> String {
    let members = summary
        .members
        .iter()
        .map(|member| format!("{}({})", member.name, grade_text(member.grade)))
        .collect::<Vec<_>>()
        .join(", ");
    let average = summary
        .average_score
        .map_or_else(|| "n/a".to_string(), |average| format!("{average:.1}"));
    let distribution = Grade::ordered()
        .into_iter()
        .map(|grade| format!("{}({})", grade.label(), summary.grades.get(grade)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are an HR data analyst. Analyze the {quarter} performance data of the {department} department \
and write an executive briefing.

[Department data]
- Headcount: {count}
- Average score: {average}
- Grade distribution: {distribution}
- Members: {members}

[Requests]
- Summarize the overall performance climate.
- Identify strong and weak performers and assess the balance.
- Give one sentence of key advice for managing the department.",
        quarter = quarter_title(period),
        department = summary.department,
        count = summary.count,
    )
}

fn quarter_title(period: Period) -> String {
    format!("Q{} {}", period.quarter(), period.year())
}
