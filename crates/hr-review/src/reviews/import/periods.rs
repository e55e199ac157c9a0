use crate::reviews::domain::{quarter_of_month, Period};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static PERIOD_ALIASES: OnceLock<HashMap<&'static str, Period>> = OnceLock::new();

fn period_aliases() -> &'static HashMap<&'static str, Period> {
    PERIOD_ALIASES.get_or_init(|| {
        const ALIASES: &[(&str, Period)] = &[
            ("24q3", Period::Q3Of2024),
            ("24q4", Period::Q4Of2024),
            ("25q1", Period::Q1Of2025),
            ("25q2", Period::Q2Of2025),
            ("25q3", Period::Q3Of2025),
            ("25q4", Period::Q4Of2025),
            ("43분기", Period::Q3Of2025),
            ("44분기", Period::Q4Of2025),
            ("4/4분기", Period::Q4Of2025),
            ("2024년3분기", Period::Q3Of2024),
            ("2024년4분기", Period::Q4Of2024),
            ("2025년1분기", Period::Q1Of2025),
            ("2025년2분기", Period::Q2Of2025),
            ("2025년3분기", Period::Q3Of2025),
            ("2025년4분기", Period::Q4Of2025),
        ];
        ALIASES.iter().copied().collect()
    })
}

fn short_quarter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d{2})q(\d)").expect("valid quarter pattern"))
}

fn year_month_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{4})[.\-](\d{1,2})").expect("valid year-month pattern"))
}

/// Maps a free-form period label to a defined quarter end.
///
/// Tries the canonical identifier, the alias table, a full ISO date, then
/// `NNqD` and `YYYY.MM` patterns. Labels outside the defined quarters yield
/// `None`.
pub fn normalize_period(value: &str) -> Option<Period> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(period) = Period::from_identifier(trimmed) {
        return Some(period);
    }

    let compact: String = trimmed
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '.')
        .flat_map(char::to_lowercase)
        .collect();
    if let Some(period) = period_aliases().get(compact.as_str()) {
        return Some(*period);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Period::for_date(date);
    }

    if let Some(captures) = short_quarter_pattern().captures(trimmed) {
        let year: i32 = captures[1].parse().ok()?;
        let quarter: u32 = captures[2].parse().ok()?;
        return Period::from_quarter(2000 + year, quarter);
    }

    if let Some(captures) = year_month_pattern().captures(trimmed) {
        let year: i32 = captures[1].parse().ok()?;
        let month: u32 = captures[2].parse().ok()?;
        return Period::from_quarter(year, quarter_of_month(month)?);
    }

    None
}
