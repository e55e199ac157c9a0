use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{EvaluationRecord, RecordKey};
use super::import::{normalize_period, SkippedRow, SpreadsheetImporter};
use super::narrative::{Narrative, NarrativeError, NarrativeService, TextGenerator};
use super::service::{ReviewService, ReviewServiceError};
use super::store::RecordStore;
use super::views::{DashboardView, RosterQuery, RosterRow, SubjectReport};
use crate::error::AppError;

/// Shared handles for the review endpoints.
pub struct ReviewState<S, G> {
    pub reviews: Arc<ReviewService<S>>,
    pub narrative: Arc<NarrativeService<G>>,
}

impl<S, G> Clone for ReviewState<S, G> {
    fn clone(&self) -> Self {
        Self {
            reviews: Arc::clone(&self.reviews),
            narrative: Arc::clone(&self.narrative),
        }
    }
}

pub fn review_router<S, G>(
    reviews: Arc<ReviewService<S>>,
    narrative: Arc<NarrativeService<G>>,
) -> Router
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    Router::new()
        .route(
            "/api/v1/reviews/records",
            get(list_records::<S, G>).post(create_record::<S, G>),
        )
        .route(
            "/api/v1/reviews/records/:subject/:period",
            put(update_record::<S, G>).delete(delete_record::<S, G>),
        )
        .route(
            "/api/v1/reviews/subjects/:subject",
            get(subject_report::<S, G>).delete(delete_subject::<S, G>),
        )
        .route("/api/v1/reviews/roster", get(roster::<S, G>))
        .route("/api/v1/reviews/dashboard", get(dashboard::<S, G>))
        .route("/api/v1/reviews/import", post(import_csv::<S, G>))
        .route(
            "/api/v1/reviews/subjects/:subject/report",
            post(employee_report::<S, G>),
        )
        .route(
            "/api/v1/reviews/subjects/:subject/email",
            post(feedback_email::<S, G>),
        )
        .route(
            "/api/v1/reviews/departments/:department/briefing",
            post(department_briefing::<S, G>),
        )
        .with_state(ReviewState { reviews, narrative })
}

fn record_key(subject: String, period: &str) -> Result<RecordKey, AppError> {
    let period = normalize_period(period).ok_or_else(|| {
        ReviewServiceError::Validation(format!("unknown period '{period}'"))
    })?;
    Ok(RecordKey::new(subject, period))
}

pub(crate) async fn list_records<S, G>(
    State(state): State<ReviewState<S, G>>,
) -> Result<Json<Vec<EvaluationRecord>>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    Ok(Json(state.reviews.records()?))
}

pub(crate) async fn create_record<S, G>(
    State(state): State<ReviewState<S, G>>,
    Json(draft): Json<EvaluationRecord>,
) -> Result<Response, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    let record = state.reviews.add_record(draft)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn update_record<S, G>(
    State(state): State<ReviewState<S, G>>,
    Path((subject, period)): Path<(String, String)>,
    Json(draft): Json<EvaluationRecord>,
) -> Result<Json<EvaluationRecord>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    let key = record_key(subject, &period)?;
    Ok(Json(state.reviews.update_record(&key, draft)?))
}

pub(crate) async fn delete_record<S, G>(
    State(state): State<ReviewState<S, G>>,
    Path((subject, period)): Path<(String, String)>,
) -> Result<StatusCode, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    let key = record_key(subject, &period)?;
    state.reviews.delete_record(&key)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_subject<S, G>(
    State(state): State<ReviewState<S, G>>,
    Path(subject): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    let removed = state.reviews.delete_subject(&subject)?;
    Ok(Json(json!({ "subject": subject, "removed": removed })))
}

pub(crate) async fn subject_report<S, G>(
    State(state): State<ReviewState<S, G>>,
    Path(subject): Path<String>,
) -> Result<Json<SubjectReport>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    Ok(Json(state.reviews.subject_report(&subject)?))
}

pub(crate) async fn roster<S, G>(
    State(state): State<ReviewState<S, G>>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<Vec<RosterRow>>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    Ok(Json(state.reviews.roster(&query)?))
}

pub(crate) async fn dashboard<S, G>(
    State(state): State<ReviewState<S, G>>,
) -> Result<Json<DashboardView>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    Ok(Json(state.reviews.dashboard()?))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImportParams {
    #[serde(default)]
    pub(crate) dry_run: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) dry_run: bool,
    pub(crate) parsed: usize,
    pub(crate) inserted: usize,
    pub(crate) replaced: usize,
    pub(crate) skipped: Vec<SkippedRow>,
}

/// Accepts a CSV body. Existing (subject, period) pairs are overwritten.
pub(crate) async fn import_csv<S, G>(
    State(state): State<ReviewState<S, G>>,
    Query(params): Query<ImportParams>,
    body: String,
) -> Result<Json<ImportResponse>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    let parsed = SpreadsheetImporter::from_reader(body.as_bytes())?;
    let parsed_count = parsed.records.len();

    if params.dry_run {
        return Ok(Json(ImportResponse {
            dry_run: true,
            parsed: parsed_count,
            inserted: 0,
            replaced: 0,
            skipped: parsed.skipped,
        }));
    }

    let report = state.reviews.import(parsed.records)?;
    Ok(Json(ImportResponse {
        dry_run: false,
        parsed: parsed_count,
        inserted: report.inserted,
        replaced: report.replaced,
        skipped: parsed.skipped,
    }))
}

/// Runs a narrative build on the blocking pool; generators make synchronous
/// network calls.
async fn narrate<S, G, F>(
    state: ReviewState<S, G>,
    build: F,
) -> Result<Json<Narrative>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
    F: FnOnce(&NarrativeService<G>, &[EvaluationRecord]) -> Result<Narrative, NarrativeError>
        + Send
        + 'static,
{
    let records = state.reviews.records()?;
    let narrative = Arc::clone(&state.narrative);
    let outcome =
        tokio::task::spawn_blocking(move || build(narrative.as_ref(), records.as_slice()))
            .await
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    Ok(Json(outcome?))
}

pub(crate) async fn employee_report<S, G>(
    State(state): State<ReviewState<S, G>>,
    Path(subject): Path<String>,
) -> Result<Json<Narrative>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    narrate(state, move |narrative, records| {
        narrative.employee_report(&subject, records)
    })
    .await
}

pub(crate) async fn feedback_email<S, G>(
    State(state): State<ReviewState<S, G>>,
    Path(subject): Path<String>,
) -> Result<Json<Narrative>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    narrate(state, move |narrative, records| {
        narrative.feedback_email(&subject, records)
    })
    .await
}

pub(crate) async fn department_briefing<S, G>(
    State(state): State<ReviewState<S, G>>,
    Path(department): Path<String>,
) -> Result<Json<Narrative>, AppError>
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    narrate(state, move |narrative, records| {
        narrative.department_briefing(&department, records)
    })
    .await
}
