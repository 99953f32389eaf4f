use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::info;
use crate::config::Config;
use crate::helpers::auth::AuthSettings;
use crate::helpers::handler_404::page_not_found_handler;
use crate::helpers::request_logger::log_endpoint_stats;
use crate::repositories::AppRepository;
use crate::services::mailer::Mailer;
use crate::services::place_locator::PlaceLocator;
use crate::services::recommendation::RecommendationComposer;

pub mod admin_controller;
pub mod api_error;
pub mod auth_controller;
pub mod health_check;
pub mod places_controller;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn AppRepository>,
    pub locator: Arc<PlaceLocator>,
    pub composer: Arc<RecommendationComposer>,
    pub mailer: Arc<dyn Mailer>,
    pub auth: Arc<AuthSettings>,
}

pub async fn serve(
    app_state: AppState,
    config: &Config,
) -> anyhow::Result<()> {
    let origins = config
        .origin_urls
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<HeaderValue>, _>>()
        .context("ORIGIN_URLS contains an invalid origin")?;

    let application = router_endpoints(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::OPTIONS
                        ])
                        .allow_origin(origins)
                        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                        .allow_credentials(true)
                )
        );

    let address: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("HOST and PORT do not form a valid socket address")?;
    info!("API server listening on: {}", address);
    axum::Server::bind(&address)
        .serve(application.into_make_service())
        .await
        .context("Error spinning up the API server")
}

pub fn router_endpoints(app_state: AppState) -> Router {
    Router::new()
        .merge(health_check::router())
        .merge(auth_controller::router(app_state.clone()))
        .merge(places_controller::router(app_state.clone()))
        .nest("/admin", admin_controller::router(app_state.clone()))
        .fallback(page_not_found_handler)
        .layer(middleware::from_fn_with_state(app_state, log_endpoint_stats))
}
