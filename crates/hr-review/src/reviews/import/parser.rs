use super::headers::{ColumnMap, ReviewField};
use super::periods::normalize_period;
use super::{ImportError, ParsedImport, SkippedRow};
use crate::reviews::domain::{EvaluationRecord, Grade, Period};
use std::io::Read;

pub(crate) const DEFAULT_METHOD: &str = "absolute";

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<ParsedImport, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(ImportError::Empty);
    }

    let columns = ColumnMap::from_headers(&headers);
    if columns.get(ReviewField::Name).is_none() {
        return Err(ImportError::MissingNameColumn);
    }

    let mut parsed = ParsedImport::default();
    let mut data_rows = 0usize;
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        data_rows += 1;
        // Header occupies line 1.
        let line = index + 2;
        let cell = |field: ReviewField| {
            columns
                .get(field)
                .and_then(|column| row.get(column))
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let Some(subject_name) = cell(ReviewField::Name) else {
            continue;
        };

        let period = match cell(ReviewField::Period) {
            None => Period::latest(),
            Some(label) => match normalize_period(label) {
                Some(period) => period,
                None => {
                    parsed.skipped.push(SkippedRow {
                        line,
                        subject_name: subject_name.to_string(),
                        period_label: label.to_string(),
                    });
                    continue;
                }
            },
        };

        let text = |field: ReviewField| cell(field).unwrap_or_default().to_string();
        let optional = |field: ReviewField| cell(field).map(str::to_string);

        parsed.records.push(EvaluationRecord {
            period,
            subject_name: subject_name.to_string(),
            department: text(ReviewField::Department),
            position: text(ReviewField::Position),
            evaluator1: text(ReviewField::Evaluator1),
            evaluator2: optional(ReviewField::Evaluator2),
            method: cell(ReviewField::Method)
                .unwrap_or(DEFAULT_METHOD)
                .to_string(),
            score: cell(ReviewField::Score).and_then(parse_score),
            grade: cell(ReviewField::Grade).and_then(Grade::parse),
            rank: cell(ReviewField::Rank).and_then(parse_rank),
            feedback1: optional(ReviewField::Feedback1),
            feedback2: optional(ReviewField::Feedback2),
        });
    }

    if data_rows == 0 {
        return Err(ImportError::Empty);
    }

    Ok(parsed)
}

fn parse_score(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
}

fn parse_rank(value: &str) -> Option<u32> {
    let rank = value.parse::<f64>().ok()?.trunc();
    if rank >= 1.0 && rank <= f64::from(u32::MAX) {
        Some(rank as u32)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) fn parse_rank_for_tests(value: &str) -> Option<u32> {
    parse_rank(value)
}
