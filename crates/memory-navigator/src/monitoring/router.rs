use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde_json::json;

use super::domain::{SubjectId, SubjectProfile};
use super::ingestion::{EventPayload, TelemetryPayload};
use super::repository::{AlertPublisher, ProfileRepository};
use super::service::{MonitoringService, MonitoringServiceError};

/// Router exposing device ingestion and the caregiver profile surface.
pub fn monitoring_router<R, A>(service: Arc<MonitoringService<R, A>>) -> Router
where
    R: ProfileRepository + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/ingestion/telemetry",
            post(telemetry_handler::<R, A>),
        )
        .route("/api/v1/ingestion/events", post(event_handler::<R, A>))
        .route(
            "/api/v1/subjects/:subject_id/profile",
            put(upsert_profile_handler::<R, A>)
                .get(profile_handler::<R, A>)
                .delete(remove_profile_handler::<R, A>),
        )
        .with_state(service)
}

pub(crate) async fn telemetry_handler<R, A>(
    State(service): State<Arc<MonitoringService<R, A>>>,
    payload: Result<Json<TelemetryPayload>, JsonRejection>,
) -> Response
where
    R: ProfileRepository + 'static,
    A: AlertPublisher + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    match service.ingest_telemetry(payload) {
        Ok(assessment) => {
            let status = if assessment.undelivered_alerts.is_empty() {
                "success"
            } else {
                "partial"
            };
            let body = json!({
                "status": status,
                "device_id": assessment.subject_id,
                "evaluated": assessment.results.len(),
                "results": assessment.results,
                "undelivered_alerts": assessment.undelivered_alerts,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn event_handler<R, A>(
    State(service): State<Arc<MonitoringService<R, A>>>,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> Response
where
    R: ProfileRepository + 'static,
    A: AlertPublisher + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    match service.ingest_event(payload) {
        Ok((event, result)) => {
            let body = json!({
                "status": "success",
                "device_id": event.subject_id,
                "event_type": event.event_type,
                "result": result,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upsert_profile_handler<R, A>(
    State(service): State<Arc<MonitoringService<R, A>>>,
    Path(subject_id): Path<String>,
    profile: Result<Json<SubjectProfile>, JsonRejection>,
) -> Response
where
    R: ProfileRepository + 'static,
    A: AlertPublisher + 'static,
{
    let Json(profile) = match profile {
        Ok(profile) => profile,
        Err(rejection) => return rejection_response(rejection),
    };

    let result = SubjectId::new(subject_id)
        .map_err(MonitoringServiceError::from)
        .and_then(|subject_id| service.upsert_profile(subject_id, profile));

    match result {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn profile_handler<R, A>(
    State(service): State<Arc<MonitoringService<R, A>>>,
    Path(subject_id): Path<String>,
) -> Response
where
    R: ProfileRepository + 'static,
    A: AlertPublisher + 'static,
{
    let result = SubjectId::new(subject_id)
        .map_err(MonitoringServiceError::from)
        .and_then(|subject_id| service.profile(&subject_id));

    match result {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_profile_handler<R, A>(
    State(service): State<Arc<MonitoringService<R, A>>>,
    Path(subject_id): Path<String>,
) -> Response
where
    R: ProfileRepository + 'static,
    A: AlertPublisher + 'static,
{
    let result = SubjectId::new(subject_id)
        .map_err(MonitoringServiceError::from)
        .and_then(|subject_id| service.remove_profile(&subject_id));

    match result {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: MonitoringServiceError) -> Response {
    let status = match &error {
        MonitoringServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MonitoringServiceError::ConfigurationMissing(_) => StatusCode::NOT_FOUND,
        MonitoringServiceError::Repository(_) | MonitoringServiceError::Alert(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

/// Body rejections keep axum's status code but use the same JSON error shape.
fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
    });
    (rejection.status(), Json(payload)).into_response()
}
