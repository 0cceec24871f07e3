//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::error::TrailstopError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<TrailstopError> for WebError {
    fn from(err: TrailstopError) -> Self {
        let status = match &err {
            TrailstopError::NoData { .. } => StatusCode::NOT_FOUND,
            TrailstopError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TrailstopError::InvalidParameter { .. }
            | TrailstopError::ConfigParse { .. }
            | TrailstopError::ConfigMissing { .. }
            | TrailstopError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
            TrailstopError::Data { .. } | TrailstopError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let err: WebError = TrailstopError::NoData {
            ticker: "XYZ".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: WebError = TrailstopError::InsufficientData {
            ticker: "XYZ".into(),
            bars: 3,
            minimum: 14,
        }
        .into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err: WebError = TrailstopError::InvalidParameter {
            name: "period".into(),
            reason: "must be at least 1".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
