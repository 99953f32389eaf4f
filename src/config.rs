use std::time::Duration;
use clap::Parser;
use crate::helpers::auth::AuthSettings;
use crate::services::place_locator::LocatorConfig;
use crate::services::recommendation::ComposerConfig;

#[derive(Parser, Clone)]
pub struct Config {
    #[clap(env, long, default_value = "development")]
    pub environment: String,

    #[clap(env, long, default_value = "127.0.0.1")]
    pub host: String,

    #[clap(env, long, default_value_t = 8000)]
    pub port: u16,

    /// Comma separated list of frontend origins allowed by CORS
    #[clap(env, long, default_value = "http://127.0.0.1:5500,http://localhost:5500")]
    pub origin_urls: String,

    #[clap(env, long)]
    pub database_url: String,

    #[clap(env, long)]
    pub google_api_key: String,

    #[clap(env, long, default_value = "https://maps.googleapis.com/maps/api/place/nearbysearch/json")]
    pub places_api_url: String,

    #[clap(env, long, default_value = "https://api-inference.huggingface.co/models/deepset/roberta-base-squad2")]
    pub scorer_api_url: String,

    #[clap(env, long)]
    pub scorer_api_token: Option<String>,

    #[clap(env, long)]
    pub secret_key: String,

    #[clap(env, long)]
    pub reset_password_secret_key: String,

    #[clap(env, long, default_value_t = 30)]
    pub access_token_expire_minutes: i64,

    #[clap(env, long, default_value_t = 15)]
    pub reset_password_expire_minutes: i64,

    #[clap(env, long, default_value_t = 20)]
    pub free_api_calls: i32,

    #[clap(env, long, default_value_t = 100.0)]
    pub search_padding_meters: f64,

    #[clap(env, long, default_value_t = 100.0)]
    pub filter_tolerance_meters: f64,

    #[clap(env, long, default_value_t = 3)]
    pub max_results: usize,

    #[clap(env, long, default_value_t = 10)]
    pub directory_timeout_secs: u64,

    #[clap(env, long, default_value_t = 30)]
    pub scorer_timeout_secs: u64,

    #[clap(env, long)]
    pub mailgun_api_key: Option<String>,

    #[clap(env, long)]
    pub mailgun_domain: Option<String>,

    #[clap(env, long, default_value = "http://localhost:5500")]
    pub frontend_url: String,
}

impl Config {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig {
            padding_meters: self.search_padding_meters,
            tolerance_meters: self.filter_tolerance_meters,
            max_results: self.max_results,
            timeout: Duration::from_secs(self.directory_timeout_secs),
        }
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            timeout: Duration::from_secs(self.scorer_timeout_secs),
        }
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            secret_key: self.secret_key.clone(),
            reset_password_secret_key: self.reset_password_secret_key.clone(),
            access_token_expire_minutes: self.access_token_expire_minutes,
            reset_password_expire_minutes: self.reset_password_expire_minutes,
            password_hash_cost: bcrypt::DEFAULT_COST,
            secure_cookies: !self.is_development(),
            free_api_calls: self.free_api_calls,
            frontend_url: self.frontend_url.clone(),
        }
    }
}
