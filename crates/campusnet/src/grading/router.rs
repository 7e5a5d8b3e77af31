use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{EnrollmentId, StudentId};
use super::engine::{GradeCalculationEngine, GradeCalculationError};
use super::store::DocumentStore;

/// Router builder exposing the calculation operations over HTTP.
pub fn grading_router<S>(engine: Arc<GradeCalculationEngine<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route(
            "/calculate-grade/:enrollment_id",
            post(calculate_grade_handler::<S>),
        )
        .route(
            "/update-grade-aggregate/:enrollment_id",
            post(update_grade_aggregate_handler::<S>),
        )
        .route("/calculate-gpa/:student_id", get(calculate_gpa_handler::<S>))
        .with_state(engine)
}

pub(crate) async fn calculate_grade_handler<S>(
    State(engine): State<Arc<GradeCalculationEngine<S>>>,
    Path(enrollment_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match engine.calculate_grade(&EnrollmentId(enrollment_id)) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_grade_aggregate_handler<S>(
    State(engine): State<Arc<GradeCalculationEngine<S>>>,
    Path(enrollment_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match engine.update_grade_aggregate(&EnrollmentId(enrollment_id)) {
        Ok(_) => (StatusCode::OK, axum::Json(json!({ "success": true }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn calculate_gpa_handler<S>(
    State(engine): State<Arc<GradeCalculationEngine<S>>>,
    Path(student_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match engine.calculate_student_gpa(&StudentId(student_id)) {
        Ok(gpa) => (StatusCode::OK, axum::Json(json!({ "gpa": gpa }))).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: GradeCalculationError) -> Response {
    let status = if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else if error.is_malformed() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = axum::Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
