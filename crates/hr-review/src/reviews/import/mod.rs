mod headers;
mod parser;
mod periods;

pub use headers::{normalize_header, ColumnMap, ReviewField};
pub use periods::normalize_period;

use crate::reviews::domain::EvaluationRecord;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read spreadsheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid spreadsheet data: {0}")]
    Csv(#[from] csv::Error),
    #[error("no employee name column found; add a header such as \"이름\" or \"name\"")]
    MissingNameColumn,
    #[error("the spreadsheet has no data rows")]
    Empty,
}

/// Row dropped because its period label maps to no defined quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub subject_name: String,
    pub period_label: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedImport {
    pub records: Vec<EvaluationRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Turns an exported evaluation sheet into records ready for the review service.
pub struct SpreadsheetImporter;

impl SpreadsheetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ParsedImport, ImportError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening evaluation spreadsheet");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ParsedImport, ImportError> {
        let parsed = parser::parse_rows(reader)?;
        info!(
            records = parsed.records.len(),
            skipped = parsed.skipped.len(),
            "evaluation spreadsheet parsed"
        );
        Ok(parsed)
    }
}
