use crate::orchestration::{AnalysisError, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::AdInput(_) | AnalysisError::AffiliateInput(_) => {
                AppError::BadRequest(err.to_string())
            }
            AnalysisError::Store(StoreError::Db(e)) => e.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %error_message, "request failed");
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestError;

    #[test]
    fn input_errors_are_bad_requests() {
        let err: AppError = AnalysisError::AffiliateInput(IngestError::Empty).into();
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "affiliate export: input is empty"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn store_errors_are_internal() {
        let err: AppError =
            AnalysisError::Store(StoreError::Unavailable("poisoned".into())).into();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
