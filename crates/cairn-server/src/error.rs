use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cairn_core::CoreError;
use cairn_stream::{ErrorKind, StreamError};
use serde::Serialize;
use thiserror::Error;

/// Body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("block of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StreamError> for ServerError {
    fn from(err: StreamError) -> Self {
        Self::Core(err.into())
    }
}

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::BadRequest(_) | Self::PayloadTooLarge { .. } => ErrorKind::Input,
            Self::Io(_) => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => match self.kind() {
                ErrorKind::Input => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Pinned => StatusCode::CONFLICT,
                ErrorKind::Io | ErrorKind::Cancelled | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            message: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_types::TypeError;

    #[test]
    fn status_codes() {
        assert_eq!(
            ServerError::from(CoreError::from(TypeError::EmptyKey)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::PayloadTooLarge { size: 3, max: 2 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ServerError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_json() {
        let body = ErrorResponse {
            message: "zero length cid invalid".into(),
            kind: ErrorKind::Input,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"Message":"zero length cid invalid","Kind":"input"}"#
        );
    }
}
