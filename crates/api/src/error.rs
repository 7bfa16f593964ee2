//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use feature_engine::FeatureError;
use inference_engine::InferenceError;
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Artifacts were not loaded at startup
    #[error("model not ready: {0}")]
    NotReady(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady(_) | ApiError::Inference(InferenceError::NotReady(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Inference(InferenceError::Feature(e)) => feature_status(e),
            ApiError::Storage(StorageError::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::InvalidValue(_)) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotReady(_) | ApiError::Inference(InferenceError::NotReady(_)) => "not_ready",
            ApiError::Inference(InferenceError::Feature(e)) => match e {
                FeatureError::UnknownCategory { .. } => "unknown_category",
                FeatureError::InvalidMonth(_) => "invalid_month",
                FeatureError::Validation(_) => "invalid_input",
                FeatureError::MissingNumericFeature(_) => "missing_feature",
                FeatureError::SchemaMismatch(_) => "schema_mismatch",
                FeatureError::DimensionMismatch { .. } => "dimension_mismatch",
                _ => "internal",
            },
            // Model width disagrees with the feature order it was loaded with
            ApiError::Inference(InferenceError::InvalidInputShape { .. }) => "dimension_mismatch",
            ApiError::Storage(StorageError::RecordNotFound(_)) => "not_found",
            ApiError::Storage(StorageError::InvalidValue(_)) => "invalid_input",
            _ => "internal",
        }
    }
}

fn feature_status(e: &FeatureError) -> StatusCode {
    match e {
        FeatureError::SchemaMismatch(_) => StatusCode::SERVICE_UNAVAILABLE,
        FeatureError::MissingNumericFeature(_) => StatusCode::BAD_REQUEST,
        e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Rejected request: {}", self);
        }

        let body = ErrorBody {
            error: self.kind(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(e: FeatureError) -> ApiError {
        ApiError::Inference(InferenceError::Feature(e))
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::NotReady("missing".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            feature(FeatureError::UnknownCategory {
                field: "ship_type",
                value: "Yacht".into()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(feature(FeatureError::InvalidMonth(13)).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            feature(FeatureError::MissingNumericFeature("distance".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            feature(FeatureError::SchemaMismatch("skew".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            feature(FeatureError::DimensionMismatch {
                expected: 14,
                actual: 15
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Storage(StorageError::RecordNotFound(7)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Storage(StorageError::InvalidValue("NaN".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_kinds() {
        let model_skew = ApiError::Inference(InferenceError::InvalidInputShape {
            expected: 14,
            actual: 15,
        });
        assert_eq!(model_skew.kind(), "dimension_mismatch");
        assert_eq!(model_skew.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            feature(FeatureError::DimensionMismatch {
                expected: 14,
                actual: 15
            })
            .kind(),
            "dimension_mismatch"
        );
        assert_eq!(ApiError::NotReady("missing".into()).kind(), "not_ready");
        assert_eq!(ApiError::Storage(StorageError::RecordNotFound(7)).kind(), "not_found");
        assert_eq!(
            ApiError::Storage(StorageError::Lock("poisoned".into())).kind(),
            "internal"
        );
    }
}
