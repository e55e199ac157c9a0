use super::domain::{DerivedMetrics, Grade, RiskLevel, Trend};
use super::history::SubjectHistory;
use super::insights::compose_insight;

/// Score change (either direction) that counts as a trend.
pub const TREND_THRESHOLD: f64 = 3.0;

const RISK_D_GRADE_DROP: f64 = 10.0;
const RISK_SHARP_DROP: f64 = 15.0;
const RISK_C_GRADE_DROP: f64 = 5.0;
const RISK_SCORE_FLOOR: f64 = 60.0;

/// Compares the two most recent scored periods, skipping empty ones.
pub fn trend(history: &SubjectHistory<'_>) -> Trend {
    let scored = history.scored();
    let [.., previous, latest] = scored.as_slice() else {
        return Trend::Stable;
    };

    let diff = latest.score - previous.score;
    if diff > TREND_THRESHOLD {
        Trend::Up
    } else if diff < -TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Mean of all scored periods; `0.0` when nothing is scored.
pub fn average(history: &SubjectHistory<'_>) -> f64 {
    let scores: Vec<f64> = history.scored().iter().map(|point| point.score).collect();
    mean(&scores).unwrap_or(0.0)
}

/// Classifies the latest scored period against the one before it.
///
/// Rules are checked in order and the first match wins; fewer than two
/// scored periods defaults to `Medium`.
pub fn risk(history: &SubjectHistory<'_>) -> RiskLevel {
    let scored = history.scored();
    let [.., previous, latest] = scored.as_slice() else {
        return RiskLevel::Medium;
    };

    let drop = previous.score - latest.score;
    match latest.grade {
        Some(Grade::D) if drop > RISK_D_GRADE_DROP => RiskLevel::High,
        Some(Grade::D) => RiskLevel::High,
        _ if drop > RISK_SHARP_DROP => RiskLevel::High,
        Some(Grade::C) if drop > RISK_C_GRADE_DROP => RiskLevel::Medium,
        _ if latest.score < RISK_SCORE_FLOOR => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

pub fn derive_metrics(history: &SubjectHistory<'_>) -> DerivedMetrics {
    let trend = trend(history);
    let average = average(history);
    let risk = risk(history);
    let insight = compose_insight(history, trend, average, risk);

    DerivedMetrics {
        trend,
        average,
        risk,
        insight,
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation around a precomputed mean.
pub(crate) fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
