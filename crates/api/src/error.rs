use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use craftstats_core::CoreError;
use serde_json::json;

/// API-level error that maps core failures onto HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    BadRequest(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Serialize(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            ApiError::Core(core) => match core {
                CoreError::DataUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "DATA_UNAVAILABLE"),
                CoreError::Unreachable => (StatusCode::BAD_GATEWAY, "SERVER_UNREACHABLE"),
                CoreError::Timeout(_) => (StatusCode::BAD_GATEWAY, "SERVER_TIMEOUT"),
                CoreError::CircuitOpen => (StatusCode::BAD_GATEWAY, "CIRCUIT_OPEN"),
                CoreError::AuthFailed => (StatusCode::BAD_GATEWAY, "RCON_AUTH_FAILED"),
                CoreError::Protocol(_) => (StatusCode::BAD_GATEWAY, "PROTOCOL_ERROR"),
                CoreError::Archive(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ARCHIVE_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(%status, code, error = %self, "request failed");
        } else {
            tracing::debug!(%status, code, error = %self, "request rejected");
        }
        let body = Json(json!({
            "error": self.to_string(),
            "code": code,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_status_mapping() {
        let cases = [
            (CoreError::DataUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::Unreachable, StatusCode::BAD_GATEWAY),
            (CoreError::Timeout("connect"), StatusCode::BAD_GATEWAY),
            (CoreError::CircuitOpen, StatusCode::BAD_GATEWAY),
            (CoreError::AuthFailed, StatusCode::BAD_GATEWAY),
            (CoreError::Protocol("bad frame".into()), StatusCode::BAD_GATEWAY),
            (CoreError::Archive("bad zip".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (core, expected) in cases {
            let (status, _) = ApiError::Core(core).status_and_code();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn bad_request_maps_to_400() {
        let err = ApiError::BadRequest("limit out of range".into());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "BAD_REQUEST");
    }
}
