use crate::infra::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use hr_review::auth::{AccessPolicy, Credentials};
use hr_review::error::AppError;
use hr_review::reviews::{review_router, NarrativeService, RecordStore, ReviewService, TextGenerator};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

pub(crate) const PASSWORD_HEADER: &str = "x-dashboard-password";
pub(crate) const EMAIL_HEADER: &str = "x-dashboard-email";

/// Review endpoints behind the access gate, plus the open operational routes.
pub(crate) fn with_review_routes<S, G>(
    reviews: Arc<ReviewService<S>>,
    narrative: Arc<NarrativeService<G>>,
    policy: Arc<AccessPolicy>,
) -> Router
where
    S: RecordStore + 'static,
    G: TextGenerator + 'static,
{
    review_router(reviews, narrative)
        .route_layer(middleware::from_fn_with_state(policy, require_access))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn require_access(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = credentials_from(request.headers());
    if let Err(denied) = policy.authorize(&credentials) {
        warn!(mode = policy.mode(), reason = %denied, "review request rejected");
        return Err(denied.into());
    }
    Ok(next.run(request).await)
}

fn credentials_from(headers: &HeaderMap) -> Credentials {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    Credentials {
        password: text(PASSWORD_HEADER),
        email: text(EMAIL_HEADER),
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
