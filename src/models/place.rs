use serde::{Serialize, Serializer};
use crate::errors::PlacesError;
use crate::models::coordinate::Coordinate;

/// Meters of stride per meter of body height.
pub const STRIDE_FACTOR: f64 = 0.4;

/// A validated walk: where the person stands and how far they will go.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub origin: Coordinate,
    pub height_cm: f64,
    pub steps: u64,
    pub place_type: String,
}

impl SearchRequest {
    pub fn new(
        origin: Coordinate,
        height_cm: f64,
        steps: i64,
        place_type: &str,
    ) -> Result<Self, PlacesError> {
        if !origin.is_valid() {
            return Err(PlacesError::InvalidInput(format!(
                "coordinate ({}, {}) is out of range",
                origin.lat, origin.lng
            )));
        }
        if !height_cm.is_finite() || height_cm <= 0.0 {
            return Err(PlacesError::InvalidInput(
                "height must be a positive number of centimeters".to_string(),
            ));
        }
        let steps = u64::try_from(steps).map_err(|_| {
            PlacesError::InvalidInput("steps must not be negative".to_string())
        })?;
        let place_type = place_type.trim();
        if place_type.is_empty() {
            return Err(PlacesError::InvalidInput("location type must not be empty".to_string()));
        }

        Ok(Self {
            origin,
            height_cm,
            steps,
            place_type: place_type.to_string(),
        })
    }

    pub fn stride_length(&self) -> f64 {
        self.height_cm / 100.0 * STRIDE_FACTOR
    }

    pub fn walking_distance(&self) -> f64 {
        self.stride_length() * self.steps as f64
    }

    pub fn search_radius(&self, padding_meters: f64) -> f64 {
        self.walking_distance() + padding_meters
    }
}

/// A place as the directory reported it.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub coordinate: Coordinate,
    pub address: String,
    pub rating: Option<f64>,
    pub place_id: String,
}

/// A candidate that survived filtering, with its distance and map link.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct RankedCandidate {
    pub name: String,
    pub address: String,
    #[serde(serialize_with = "round_two_decimals")]
    pub distance: f64,
    pub rating: f64,
    pub url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place_id: String,
}

fn round_two_decimals<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

#[derive(Clone, Debug, PartialEq)]
pub enum LocateOutcome {
    Found(Vec<RankedCandidate>),
    NoResults,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub candidates: Vec<RankedCandidate>,
    pub chosen_name: String,
}

impl Recommendation {
    /// Finds the candidate the chosen name refers to, if any.
    ///
    /// The scorer's answer is free text, so this is a best effort: an exact
    /// case-insensitive match wins, otherwise the first candidate whose name
    /// contains the answer or is contained by it.
    pub fn matched_candidate(&self) -> Option<&RankedCandidate> {
        let answer = self.chosen_name.trim().to_lowercase();
        if answer.is_empty() {
            return None;
        }

        self.candidates
            .iter()
            .find(|c| c.name.to_lowercase() == answer)
            .or_else(|| {
                self.candidates.iter().find(|c| {
                    let name = c.name.to_lowercase();
                    name.contains(&answer) || answer.contains(&name)
                })
            })
    }
}
