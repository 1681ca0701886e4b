use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use turnstile_axum::{requirement_guard, AuthGate, ErrorBody};
use uuid::Uuid;

use super::{
    InvalidTrafficLog, TrafficLog, TrafficLogNotFound, TrafficLogPatch, TrafficLogRepository,
};

requirement_guard!(pub ReadTrafficLogs; "traffic_logs:read");
requirement_guard!(pub WriteTrafficLogs; "traffic_logs:write");

/// Everything the traffic-log handlers share
#[derive(Clone, Debug)]
pub struct TrafficLogState {
    repository: Arc<dyn TrafficLogRepository>,
    gate: AuthGate,
}

impl TrafficLogState {
    /// Combines a store with the gate guarding it
    pub fn new(repository: impl TrafficLogRepository, gate: AuthGate) -> Self {
        Self {
            repository: Arc::new(repository),
            gate,
        }
    }
}

impl FromRef<TrafficLogState> for AuthGate {
    fn from_ref(state: &TrafficLogState) -> Self {
        state.gate.clone()
    }
}

/// The envelope around traffic log answers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLogResponse {
    /// The HTTP status, repeated
    pub status: u16,
    /// The id of the log concerned
    pub id: Uuid,
    /// What happened
    pub message: String,
    /// The log as stored after the operation
    pub traffic_log: TrafficLog,
}

impl TrafficLogResponse {
    fn new(status: StatusCode, id: Uuid, message: &str, traffic_log: TrafficLog) -> Self {
        Self {
            status: status.as_u16(),
            id,
            message: message.to_owned(),
            traffic_log,
        }
    }
}

impl IntoResponse for TrafficLogResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

enum Rejection {
    NotFound(String),
    Invalid(InvalidTrafficLog),
}

impl From<TrafficLogNotFound> for Rejection {
    fn from(err: TrafficLogNotFound) -> Self {
        Self::NotFound(err.id.to_string())
    }
}

impl From<InvalidTrafficLog> for Rejection {
    fn from(err: InvalidTrafficLog) -> Self {
        Self::Invalid(err)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    message: "Traffic log not found".into(),
                    identifier: Some(id),
                },
            ),
            Self::Invalid(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    message: err.to_string(),
                    identifier: Some(err.field.into()),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Ids that do not parse are reported the same way as unknown ids
fn parse_id(raw: &str) -> Result<Uuid, Rejection> {
    Uuid::parse_str(raw).map_err(|_| Rejection::NotFound(raw.to_owned()))
}

/// The traffic-log service's routes
pub fn router(state: TrafficLogState) -> Router {
    Router::new()
        .route("/echo", get(echo))
        .route("/traffic-logs", post(create))
        .route("/traffic-logs/:id", get(read).patch(update).delete(remove))
        .with_state(state)
}

async fn echo() -> Json<serde_json::Value> {
    Json(json!({ "message": "Server up and running!" }))
}

async fn create(
    _: WriteTrafficLogs,
    State(state): State<TrafficLogState>,
    Json(log): Json<TrafficLog>,
) -> Result<TrafficLogResponse, Rejection> {
    log.validate()?;
    let id = state.repository.create(log.clone());
    tracing::info!(traffic_log.id = %id, "traffic log created");

    Ok(TrafficLogResponse::new(
        StatusCode::CREATED,
        id,
        "Traffic log created",
        log,
    ))
}

async fn read(
    _: ReadTrafficLogs,
    State(state): State<TrafficLogState>,
    Path(id): Path<String>,
) -> Result<TrafficLogResponse, Rejection> {
    let id = parse_id(&id)?;
    let log = state.repository.get(id)?;

    Ok(TrafficLogResponse::new(
        StatusCode::OK,
        id,
        "Traffic log found",
        log,
    ))
}

async fn update(
    _: WriteTrafficLogs,
    State(state): State<TrafficLogState>,
    Path(id): Path<String>,
    Json(patch): Json<TrafficLogPatch>,
) -> Result<TrafficLogResponse, Rejection> {
    let id = parse_id(&id)?;
    patch.validate()?;
    let log = state.repository.update(id, patch)?;
    tracing::info!(traffic_log.id = %id, "traffic log updated");

    Ok(TrafficLogResponse::new(
        StatusCode::OK,
        id,
        "Traffic log updated",
        log,
    ))
}

async fn remove(
    _: WriteTrafficLogs,
    State(state): State<TrafficLogState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Rejection> {
    let id = parse_id(&id)?;
    state.repository.delete(id)?;
    tracing::info!(traffic_log.id = %id, "traffic log deleted");

    Ok(StatusCode::NO_CONTENT)
}
