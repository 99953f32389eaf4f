use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tracing::debug;
use crate::controller::api_error::ApiError;
use crate::controller::AppState;
use crate::helpers::auth_extractor::AdminUser;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/endpoint-stats", get(retrieve_endpoint_stats))
        .route("/api-usage", get(retrieve_api_usage))
        .route_layer(Extension(app_state))
}

pub async fn retrieve_endpoint_stats(
    Extension(app_state): Extension<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    debug!("Admin {} requested endpoint stats", admin.user_id);
    let stats = app_state.repo.get_endpoint_stats().await?;
    Ok((StatusCode::OK, Json(stats)))
}

pub async fn retrieve_api_usage(
    Extension(app_state): Extension<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    debug!("Admin {} requested api usage", admin.user_id);
    let usage = app_state.repo.get_api_usage().await?;
    Ok((StatusCode::OK, Json(usage)))
}
