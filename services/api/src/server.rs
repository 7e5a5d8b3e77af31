use crate::cli::ServeArgs;
use crate::infra::{seed_demo_records, AppState, InMemoryDocumentStore};
use crate::routes::with_grading_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campusnet::config::AppConfig;
use campusnet::error::AppError;
use campusnet::grading::GradeCalculationEngine;
use campusnet::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let store = Arc::new(InMemoryDocumentStore::default());
    if args.seed_demo {
        let dataset = seed_demo_records(store.as_ref()).map_err(|err| {
            AppError::Grading(campusnet::grading::GradeCalculationError::Store(err))
        })?;
        info!(
            enrollments = dataset.enrollments.len(),
            course_instance = %dataset.course_instance,
            "demo dataset seeded"
        );
    }
    let engine = Arc::new(GradeCalculationEngine::new(store));

    let app = with_grading_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "grade calculation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
