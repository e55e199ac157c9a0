//! Quarterly evaluation records and everything derived from them.
//!
//! Records flow from a [`RecordStore`] snapshot through the history resolver
//! into the metric functions, then into the insight composer and the
//! aggregation views. Nothing derived is stored; each query recomputes.

pub mod aggregates;
pub mod domain;
pub mod history;
pub mod import;
pub mod insights;
pub mod metrics;
pub mod narrative;
pub mod router;
pub mod service;
pub mod store;
pub mod views;

pub use aggregates::{
    department_summaries, department_trend, grade_distribution, kpi_summary, DepartmentSummary,
    GradeCounts, GradeDistributionEntry, KpiSummary,
};
pub use domain::{
    DerivedMetrics, EvaluationRecord, Grade, Period, RecordKey, RiskLevel, Trend,
};
pub use history::{resolve_history, HistoryEntry, SubjectHistory};
pub use import::{ImportError, ParsedImport, SkippedRow, SpreadsheetImporter};
pub use insights::{compose_insight, InsightClause};
pub use metrics::derive_metrics;
pub use narrative::{
    GenerationError, GenerationRequest, Narrative, NarrativeError, NarrativeKind,
    NarrativeService, TextGenerator,
};
pub use router::review_router;
pub use service::{ImportReport, ReviewService, ReviewServiceError};
pub use store::{sort_snapshot, RecordStore, StoreError, UpsertOutcome};
pub use views::{
    DashboardView, FeedbackEntry, RosterQuery, RosterRow, SortDirection, SortKey, SubjectReport,
};

#[cfg(test)]
pub(crate) mod tests;
