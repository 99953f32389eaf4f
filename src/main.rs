use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use bb8_postgres::bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::NoTls;
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use crate::config::Config;
use crate::controller::AppState;
use crate::repositories::postgres_repo::PostgresConnectionRepo;
use crate::services::mailer::{LogMailer, Mailer, MailgunMailer};
use crate::services::place_locator::PlaceLocator;
use crate::services::places_directory::GooglePlacesDirectory;
use crate::services::recommendation::RecommendationComposer;
use crate::services::scorer::HuggingFaceScorer;

pub mod config;
pub mod controller;
pub mod errors;
pub mod helpers;
pub mod models;
pub mod repositories;
pub mod services;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    info!("Starting stride places backend in {} mode", config.environment);

    let manager = PostgresConnectionManager::new_from_stringlike(&config.database_url, NoTls)
        .context("DATABASE_URL is not a valid postgres connection string")?;
    let postgres_connection = Pool::builder()
        .build(manager)
        .await
        .context("Failed to build postgres connection pool")?;

    let postgres_repo = PostgresConnectionRepo::new(postgres_connection);
    postgres_repo.run_migrations().await?;

    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")?;

    let directory = GooglePlacesDirectory::new(
        http_client.clone(),
        config.places_api_url.clone(),
        config.google_api_key.clone(),
    );
    let scorer = HuggingFaceScorer::new(
        http_client.clone(),
        config.scorer_api_url.clone(),
        config.scorer_api_token.clone(),
    );

    let mailer: Arc<dyn Mailer> = match (&config.mailgun_api_key, &config.mailgun_domain) {
        (Some(api_key), Some(domain)) => Arc::new(MailgunMailer::new(
            http_client.clone(),
            api_key.clone(),
            domain.clone(),
        )),
        _ => {
            warn!("MAILGUN_API_KEY or MAILGUN_DOMAIN not set, password reset emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let app_state = AppState {
        repo: Arc::new(postgres_repo),
        locator: Arc::new(PlaceLocator::new(Arc::new(directory), config.locator_config())),
        composer: Arc::new(RecommendationComposer::new(Arc::new(scorer), config.composer_config())),
        mailer,
        auth: Arc::new(config.auth_settings()),
    };

    controller::serve(app_state, &config).await
}
