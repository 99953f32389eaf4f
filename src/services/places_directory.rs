use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::errors::PlacesError;
use crate::models::coordinate::Coordinate;
use crate::models::place::Candidate;

/// Largest radius the nearby search endpoint accepts.
pub const MAX_DIRECTORY_RADIUS: f64 = 50_000.0;

pub enum DirectoryResponse {
    Places(Vec<Candidate>),
    ZeroResults,
}

/// Resolves places of a given type near a coordinate.
#[async_trait]
pub trait PlacesDirectory: Send + Sync {
    async fn nearby_search(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        place_type: &str,
    ) -> Result<DirectoryResponse, PlacesError>;
}

#[derive(Clone, Serialize, Debug)]
struct GooglePlacesApiParams {
    location: String,
    radius: String,
    r#type: String,
    key: String,
}

#[derive(Deserialize, Debug)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyPlace>,
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct NearbyPlace {
    name: String,
    geometry: Geometry,
    #[serde(default)]
    vicinity: String,
    rating: Option<f64>,
    place_id: String,
}

#[derive(Deserialize, Debug)]
struct Geometry {
    location: Location,
}

#[derive(Deserialize, Debug)]
struct Location {
    lat: f64,
    lng: f64,
}

pub struct GooglePlacesDirectory {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GooglePlacesDirectory {
    pub fn new(
        client: reqwest::Client,
        api_url: String,
        api_key: String,
    ) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl PlacesDirectory for GooglePlacesDirectory {
    async fn nearby_search(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        place_type: &str,
    ) -> Result<DirectoryResponse, PlacesError> {
        let params = GooglePlacesApiParams {
            location: format!("{},{}", origin.lat, origin.lng),
            radius: format!("{}", radius_meters.ceil().min(MAX_DIRECTORY_RADIUS) as u32),
            r#type: place_type.to_string(),
            key: self.api_key.clone(),
        };
        debug!(
            "Querying places directory at {} within {}m for type {}",
            params.location, params.radius, params.r#type
        );

        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Places directory answered with HTTP status {}", status);
            return Err(PlacesError::UpstreamUnavailable(format!(
                "places directory returned HTTP {}",
                status
            )));
        }

        let body = response.json::<NearbySearchResponse>().await?;
        parse_nearby_search(body)
    }
}

fn parse_nearby_search(
    body: NearbySearchResponse,
) -> Result<DirectoryResponse, PlacesError> {
    match body.status.as_str() {
        "OK" => {
            let places = body
                .results
                .into_iter()
                .map(|place| Candidate {
                    name: place.name,
                    coordinate: Coordinate::new(place.geometry.location.lat, place.geometry.location.lng),
                    address: place.vicinity,
                    rating: place.rating,
                    place_id: place.place_id,
                })
                .collect();
            Ok(DirectoryResponse::Places(places))
        }
        "ZERO_RESULTS" => Ok(DirectoryResponse::ZeroResults),
        // Server side hiccup on their end, worth a retry
        "UNKNOWN_ERROR" => Err(PlacesError::UpstreamUnavailable(
            body.error_message.unwrap_or_else(|| "places directory reported UNKNOWN_ERROR".to_string()),
        )),
        other => {
            let message = body.error_message.unwrap_or_else(|| other.to_string());
            warn!("Places directory rejected request with status {}: {}", other, message);
            Err(PlacesError::UpstreamRejected(message))
        }
    }
}
