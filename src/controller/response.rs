// Shared response helpers for manager API controllers.

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::error::ManagerError;

/// Prefix of every manager API route.
pub const API_PREFIX: &str = "/cm_manager/v1.0";

/// Maps an error onto the HTTP status reported to callers.
pub fn error_status(err: &ManagerError) -> StatusCode {
    match err {
        ManagerError::NotFound { .. } => StatusCode::NOT_FOUND,
        ManagerError::Conflict { .. } => StatusCode::CONFLICT,
        ManagerError::Precondition(_) => StatusCode::PRECONDITION_FAILED,
        ManagerError::Remote { .. } | ManagerError::Transport { .. } | ManagerError::Migration { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ManagerError::Rollback { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ManagerError {
    fn into_response(self) -> Response {
        let status = error_status(&self);
        if status.is_server_error() {
            tracing::warn!(component = "api", event = "request_failed", status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// 200 with `value` as JSON.
pub fn ok_json<T: Serialize>(value: T) -> Response {
    (StatusCode::OK, Json(value)).into_response()
}

/// 200 with a `{"message": ..}` body.
pub fn message(text: impl Into<String>) -> Response {
    ok_json(json!({ "message": text.into() }))
}

/// Decodes an optional JSON body; an empty body yields the default value.
pub fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid request body: {}", e) })),
        )
            .into_response()
    })
}
