use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quarter-end evaluation cycles, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "2024-09-30")]
    Q3Of2024,
    #[serde(rename = "2024-12-31")]
    Q4Of2024,
    #[serde(rename = "2025-03-31")]
    Q1Of2025,
    #[serde(rename = "2025-06-30")]
    Q2Of2025,
    #[serde(rename = "2025-09-30")]
    Q3Of2025,
    #[serde(rename = "2025-12-31")]
    Q4Of2025,
}

impl Period {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Q3Of2024,
            Self::Q4Of2024,
            Self::Q1Of2025,
            Self::Q2Of2025,
            Self::Q3Of2025,
            Self::Q4Of2025,
        ]
    }

    /// The current reporting cycle.
    pub const fn latest() -> Self {
        Self::Q4Of2025
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Q3Of2024 => "2024-09-30",
            Self::Q4Of2024 => "2024-12-31",
            Self::Q1Of2025 => "2025-03-31",
            Self::Q2Of2025 => "2025-06-30",
            Self::Q3Of2025 => "2025-09-30",
            Self::Q4Of2025 => "2025-12-31",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Q3Of2024 => "24Q3",
            Self::Q4Of2024 => "24Q4",
            Self::Q1Of2025 => "25Q1",
            Self::Q2Of2025 => "25Q2",
            Self::Q3Of2025 => "25Q3",
            Self::Q4Of2025 => "25Q4",
        }
    }

    pub const fn year(self) -> i32 {
        match self {
            Self::Q3Of2024 | Self::Q4Of2024 => 2024,
            _ => 2025,
        }
    }

    pub const fn quarter(self) -> u32 {
        match self {
            Self::Q1Of2025 => 1,
            Self::Q2Of2025 => 2,
            Self::Q3Of2024 | Self::Q3Of2025 => 3,
            Self::Q4Of2024 | Self::Q4Of2025 => 4,
        }
    }

    pub fn end_date(self) -> NaiveDate {
        let (month, day) = quarter_end(self.quarter());
        NaiveDate::from_ymd_opt(self.year(), month, day).unwrap_or(NaiveDate::MIN)
    }

    pub fn previous(self) -> Option<Self> {
        let ordered = Self::ordered();
        let index = ordered.iter().position(|period| *period == self)?;
        index.checked_sub(1).map(|prev| ordered[prev])
    }

    pub fn from_identifier(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ordered()
            .into_iter()
            .find(|period| period.as_str() == value)
    }

    pub fn from_quarter(year: i32, quarter: u32) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|period| period.year() == year && period.quarter() == quarter)
    }

    /// Defined period whose quarter contains `date`.
    pub fn for_date(date: NaiveDate) -> Option<Self> {
        Self::from_quarter(date.year(), quarter_of_month(date.month())?)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const fn quarter_of_month(month: u32) -> Option<u32> {
    match month {
        1..=3 => Some(1),
        4..=6 => Some(2),
        7..=9 => Some(3),
        10..=12 => Some(4),
        _ => None,
    }
}

const fn quarter_end(quarter: u32) -> (u32, u32) {
    match quarter {
        1 => (3, 31),
        2 => (6, 30),
        3 => (9, 30),
        _ => (12, 31),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const fn ordered() -> [Self; 4] {
        [Self::A, Self::B, Self::C, Self::D]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }
}

/// One evaluation of one subject for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub period: Period,
    pub subject_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub evaluator1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator2: Option<String>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub grade: Option<Grade>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback2: Option<String>,
}

impl EvaluationRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            subject_name: self.subject_name.clone(),
            period: self.period,
        }
    }

    /// Trims free text and collapses empty optional fields to `None`.
    pub fn normalized(mut self) -> Self {
        self.subject_name = self.subject_name.trim().to_string();
        self.department = self.department.trim().to_string();
        self.position = self.position.trim().to_string();
        self.evaluator1 = self.evaluator1.trim().to_string();
        self.method = self.method.trim().to_string();
        self.evaluator2 = non_empty(self.evaluator2);
        self.feedback1 = non_empty(self.feedback1);
        self.feedback2 = non_empty(self.feedback2);
        self.rank = self.rank.filter(|rank| *rank > 0);
        self.score = self.score.filter(|score| score.is_finite());
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Identity of a record: at most one evaluation per subject and period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub subject_name: String,
    pub period: Period,
}

impl RecordKey {
    pub fn new(subject_name: impl Into<String>, period: Period) -> Self {
        Self {
            subject_name: subject_name.into(),
            period,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.subject_name, self.period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Per-subject metrics, recomputed from the store on every query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub trend: Trend,
    pub average: f64,
    pub risk: RiskLevel,
    pub insight: String,
}
