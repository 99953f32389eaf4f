use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use crate::controller::api_error::ApiError;
use crate::controller::AppState;
use crate::errors::PlacesError;
use crate::helpers::auth_extractor::AuthenticatedUser;
use crate::helpers::request_logger::record_in_background;
use crate::models::coordinate::Coordinate;
use crate::models::place::{LocateOutcome, SearchRequest};

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/llm", post(find_and_recommend))
        .route_layer(Extension(app_state))
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct WalkQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
    pub steps: i64,
    pub location_type: String,
}

/// Finds the best rated places within walking distance and asks the
/// scorer which one to recommend.
pub async fn find_and_recommend(
    Extension(app_state): Extension<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<WalkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request = SearchRequest::new(
        Coordinate::new(body.latitude, body.longitude),
        body.height,
        body.steps,
        &body.location_type,
    )?;

    let repo = app_state.repo.clone();
    let user_id = user.user_id;
    record_in_background("record api usage", async move {
        repo.record_api_call(user_id).await
    })
    .await;

    let candidates = match app_state.locator.locate(&request).await? {
        LocateOutcome::Found(candidates) => candidates,
        LocateOutcome::NoResults => {
            info!("No {} found for user {}", request.place_type, user.user_id);
            return Err(ApiError::NotFound(
                "No places found within the specified radius.".to_string(),
            ));
        }
    };

    let recommendation_res = app_state
        .composer
        .recommend(&candidates, &request.place_type)
        .await;

    let llm_recommendation = match recommendation_res {
        Ok(recommendation) => {
            if recommendation.matched_candidate().is_none() {
                debug!("Recommendation {:?} does not name any returned place", recommendation.chosen_name);
            }
            Some(recommendation.chosen_name)
        }
        Err(PlacesError::RecommendationUnavailable(reason)) => {
            warn!("Serving places without a recommendation: {}", reason);
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "response": {
                "api_response": candidates,
                "llm_recommendation": llm_recommendation,
            }
        })),
    ))
}
