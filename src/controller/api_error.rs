use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::errors::PlacesError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Something went wrong, please try again later.")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(e) => {
                error!("Internal error while handling request: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<PlacesError> for ApiError {
    fn from(e: PlacesError) -> Self {
        match e {
            PlacesError::InvalidInput(message) => ApiError::BadRequest(message),
            PlacesError::UpstreamUnavailable(_) | PlacesError::RecommendationUnavailable(_) => {
                ApiError::ServiceUnavailable(
                    "The places service is temporarily unavailable, please try again.".to_string(),
                )
            }
            PlacesError::UpstreamRejected(message) => {
                ApiError::BadGateway(format!("The places service rejected the request: {}", message))
            }
            PlacesError::NoCandidates => ApiError::Internal(anyhow::anyhow!(e)),
        }
    }
}
