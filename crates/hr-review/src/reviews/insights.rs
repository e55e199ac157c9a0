use super::domain::{Grade, RiskLevel, Trend};
use super::history::SubjectHistory;
use super::metrics::population_std_dev;
use serde::Serialize;

const HIGH_VARIANCE_STD_DEV: f64 = 15.0;
const STEADY_STD_DEV: f64 = 5.0;
const STEADY_AVERAGE_FLOOR: f64 = 75.0;
const VOLATILITY_MIN_POINTS: usize = 3;

/// A rule that fired while composing a subject's insight.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightClause {
    RisingToTopGrade,
    Rising,
    DecliningAtBottomGrade,
    Declining,
    HighVariance { std_dev: f64 },
    SteadyHighPerformer { average: f64, std_dev: f64 },
    AttritionRisk,
    SteadyState,
}

impl InsightClause {
    pub fn render(&self, subject: &str) -> String {
        match self {
            Self::RisingToTopGrade => format!(
                "{subject} has kept climbing and reached an A grade. Treat them as core talent: strengthen rewards and widen their leadership role."
            ),
            Self::Rising => format!(
                "{subject} is on a recent upswing. Assign stretch goals that keep the momentum going."
            ),
            Self::DecliningAtBottomGrade => format!(
                "{subject}'s performance is declining and needs immediate intervention. Hold a one-on-one to find the blockers and agree on tailored support."
            ),
            Self::Declining => format!(
                "{subject}'s performance fell against the previous quarter. Analyse the causes and set an improvement plan together."
            ),
            Self::HighVariance { std_dev } => format!(
                "Performance swings widely (σ={std_dev:.1}); work on stabilising results."
            ),
            Self::SteadyHighPerformer { average, std_dev } => format!(
                "Consistently high performance (average {average:.1}, σ={std_dev:.1})."
            ),
            Self::AttritionRisk => {
                "⚠️ Attrition risk is high: schedule an urgent check-in and prepare a motivation plan.".to_string()
            }
            Self::SteadyState => format!(
                "{subject} is performing at a stable level. Discuss their growth direction when setting next quarter's goals."
            ),
        }
    }
}

/// Rules that fire for a subject, in priority order. Never empty.
pub fn insight_clauses(
    history: &SubjectHistory<'_>,
    trend: Trend,
    average: f64,
    risk: RiskLevel,
) -> Vec<InsightClause> {
    let scored = history.scored();
    let latest_grade = scored.last().and_then(|point| point.grade);
    let mut clauses = Vec::new();

    match (trend, latest_grade) {
        (Trend::Up, Some(Grade::A)) => clauses.push(InsightClause::RisingToTopGrade),
        (Trend::Up, _) => clauses.push(InsightClause::Rising),
        (Trend::Down, Some(Grade::D)) => clauses.push(InsightClause::DecliningAtBottomGrade),
        (Trend::Down, _) => clauses.push(InsightClause::Declining),
        (Trend::Stable, _) => {}
    }

    if scored.len() >= VOLATILITY_MIN_POINTS {
        let scores: Vec<f64> = scored.iter().map(|point| point.score).collect();
        let std_dev = population_std_dev(&scores, average);
        if std_dev > HIGH_VARIANCE_STD_DEV {
            clauses.push(InsightClause::HighVariance { std_dev });
        } else if std_dev < STEADY_STD_DEV && average > STEADY_AVERAGE_FLOOR {
            clauses.push(InsightClause::SteadyHighPerformer { average, std_dev });
        }
    }

    if risk == RiskLevel::High {
        clauses.push(InsightClause::AttritionRisk);
    }

    if clauses.is_empty() {
        clauses.push(InsightClause::SteadyState);
    }

    clauses
}

pub fn compose_insight(
    history: &SubjectHistory<'_>,
    trend: Trend,
    average: f64,
    risk: RiskLevel,
) -> String {
    let subject = history.subject();
    insight_clauses(history, trend, average, risk)
        .iter()
        .map(|clause| clause.render(subject))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::history::resolve_history;
    use crate::reviews::metrics::{average, risk, trend};
    use crate::reviews::tests::common::series;

    fn clauses_for(scores: &[(f64, &str)]) -> Vec<InsightClause> {
        let records = series("Dana", scores);
        let history = resolve_history("Dana", &records);
        insight_clauses(&history, trend(&history), average(&history), risk(&history))
    }

    #[test]
    fn empty_history_falls_back_to_steady_state() {
        let history = resolve_history("Dana", &[]);
        let text = compose_insight(&history, Trend::Stable, 0.0, RiskLevel::Medium);
        assert_eq!(text, InsightClause::SteadyState.render("Dana"));
        assert!(text.starts_with("Dana is performing at a stable level"));
    }

    #[test]
    fn rising_to_a_grade_is_distinguished_from_plain_rise() {
        assert_eq!(
            clauses_for(&[(80.0, "B"), (88.0, "A")]),
            vec![InsightClause::RisingToTopGrade]
        );
        assert_eq!(
            clauses_for(&[(70.0, "C"), (78.0, "B")]),
            vec![InsightClause::Rising]
        );
    }

    #[test]
    fn decline_to_d_grade_also_escalates_risk() {
        assert_eq!(
            clauses_for(&[(66.0, "C"), (55.0, "D")]),
            vec![
                InsightClause::DecliningAtBottomGrade,
                InsightClause::AttritionRisk
            ]
        );
        assert_eq!(
            clauses_for(&[(84.0, "B"), (76.0, "B")]),
            vec![InsightClause::Declining]
        );
    }

    #[test]
    fn volatility_needs_three_points() {
        let clauses = clauses_for(&[(40.0, "D"), (90.0, "A")]);
        assert!(!clauses
            .iter()
            .any(|clause| matches!(clause, InsightClause::HighVariance { .. })));

        let clauses = clauses_for(&[(40.0, "D"), (90.0, "A"), (50.0, "D")]);
        assert!(clauses
            .iter()
            .any(|clause| matches!(clause, InsightClause::HighVariance { std_dev } if *std_dev > 15.0)));
    }

    #[test]
    fn steady_high_performer_requires_low_spread_and_high_average() {
        let clauses = clauses_for(&[(80.0, "B"), (81.0, "B"), (82.0, "B")]);
        assert_eq!(clauses.len(), 1);
        match &clauses[0] {
            InsightClause::SteadyHighPerformer { average, std_dev } => {
                assert!((average - 81.0).abs() < 1e-9);
                assert!(*std_dev < 1.0);
            }
            other => panic!("expected steady performer, got {other:?}"),
        }

        let clauses = clauses_for(&[(70.0, "C"), (71.0, "C"), (72.0, "C")]);
        assert_eq!(clauses, vec![InsightClause::SteadyState]);
    }

    #[test]
    fn fragments_are_joined_with_single_spaces() {
        let records = series("Dana", &[(90.0, "A"), (50.0, "D"), (40.0, "D")]);
        let history = resolve_history("Dana", &records);
        let text = compose_insight(
            &history,
            trend(&history),
            average(&history),
            risk(&history),
        );

        let expected = [
            InsightClause::DecliningAtBottomGrade.render("Dana"),
            InsightClause::HighVariance { std_dev: 21.602 }.render("Dana"),
            InsightClause::AttritionRisk.render("Dana"),
        ]
        .join(" ");
        assert_eq!(text, expected);
        assert!(text.contains("σ=21.6"));
    }
}
