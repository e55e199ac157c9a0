use crate::cli::ServeArgs;
use crate::gemini::GeminiTextGenerator;
use crate::infra::{load_reviews, AppState, InMemoryRecordStore};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hr_review::auth::AccessPolicy;
use hr_review::config::AppConfig;
use hr_review::error::AppError;
use hr_review::reviews::{NarrativeService, ReviewService};
use hr_review::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryRecordStore::default());
    let reviews = Arc::new(ReviewService::new(store.clone()));
    if args.seed.is_some() || args.sample {
        let parsed = load_reviews(args.seed.as_deref())?;
        for row in &parsed.skipped {
            warn!(
                line = row.line,
                subject = %row.subject_name,
                period = %row.period_label,
                "seed row skipped: unknown period"
            );
        }
        let report = reviews.import(parsed.records)?;
        info!(
            inserted = report.inserted,
            replaced = report.replaced,
            records = store.len(),
            "evaluation store seeded"
        );
    }

    if config.ai.has_api_key() {
        info!(
            provider = config.ai.provider.as_str(),
            model = %config.ai.model,
            "AI narratives enabled"
        );
    } else {
        warn!("no AI API key configured; narrative endpoints will ask for one");
    }
    let narrative = Arc::new(NarrativeService::new(
        Arc::new(GeminiTextGenerator::default()),
        config.ai.clone(),
    ));

    let policy = AccessPolicy::from_config(&config.auth);
    if matches!(policy, AccessPolicy::Unconfigured) {
        warn!("no APP_PASSWORD or APP_ALLOWED_EMAILS set; review endpoints will refuse every request");
    }
    info!(mode = policy.mode(), "access policy loaded");

    let app = with_review_routes(reviews, narrative, Arc::new(policy))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "quarterly review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
