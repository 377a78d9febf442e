use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use funds_core::{ErrorKind, FundsError};
use funds_types::api::ErrorResponse;

/// Error returned by every handler.
///
/// Domain errors carry a JSON body; auth failures stay bare status codes.
#[derive(Debug)]
pub enum ApiError {
    Funds(FundsError),
    Detail(ErrorKind, String),
    Status(StatusCode),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        ApiError::Detail(ErrorKind::InvalidArgument, detail.into())
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        ApiError::Detail(ErrorKind::Conflict, detail.into())
    }
}

impl From<FundsError> for ApiError {
    fn from(err: FundsError) -> Self {
        ApiError::Funds(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<StatusCode> for ApiError {
    fn from(status: StatusCode) -> Self {
        ApiError::Status(status)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::NotMature | ErrorKind::InvalidArgument => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body(kind: ErrorKind, detail: String, days_left: Option<i64>) -> Response {
    let response = ErrorResponse {
        detail,
        kind: kind.as_str().to_string(),
        days_left,
    };
    (status_for(kind), Json(response)).into_response()
}

fn internal(err: &anyhow::Error) -> Response {
    // Log the cause, never send it.
    error!("Internal error: {:#}", err);
    body(ErrorKind::Internal, "Internal server error".into(), None)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Funds(FundsError::Store(err)) => internal(&err),
            ApiError::Funds(err) => body(err.kind(), err.to_string(), err.days_left()),
            ApiError::Detail(kind, detail) => body(kind, detail, None),
            ApiError::Status(status) => status.into_response(),
            ApiError::Internal(err) => internal(&err),
        }
    }
}

/// Run blocking store work off the async runtime.
pub async fn blocking<F, T, E>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR)
        })?
        .map_err(Into::into)
}
