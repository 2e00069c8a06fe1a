use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use flashgen_core::models::{CoreError, CoreErrorKind, TaskId};

use crate::response::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("task '{0}' not found")]
    TaskNotFound(TaskId),
    #[error("task '{0}' cannot be cancelled (unknown or already finished)")]
    CancelRejected(TaskId),
    #[error("{0}")]
    Config(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Core(error) => match error.kind {
                CoreErrorKind::NotFound => StatusCode::NOT_FOUND,
                CoreErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                CoreErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::TaskNotFound(_) => StatusCode::NOT_FOUND,
            Self::CancelRejected(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }
        let body = ApiResponse::failure(status.as_u16(), self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_kinds_map_to_http_statuses() {
        let not_found = ServerError::Core(CoreError {
            strategy: None,
            task: None,
            kind: CoreErrorKind::NotFound,
            message: "missing".to_string(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = ServerError::Core(CoreError {
            strategy: None,
            task: None,
            kind: CoreErrorKind::InvalidInput,
            message: "bad".to_string(),
        });
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let rejected = ServerError::CancelRejected("t1".into());
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }
}
