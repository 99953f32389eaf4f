use thiserror::Error;

/// Failures surfaced by the place locator and recommendation composer.
///
/// An empty search is not an error, see `LocateOutcome::NoResults`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacesError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Transport failures and timeouts, safe for the caller to retry
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    // The directory answered with a structured error payload
    #[error("Upstream rejected request: {0}")]
    UpstreamRejected(String),

    #[error("Recommendation unavailable: {0}")]
    RecommendationUnavailable(String),

    #[error("Cannot recommend from an empty candidate list")]
    NoCandidates,
}

impl From<reqwest::Error> for PlacesError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PlacesError::UpstreamUnavailable(format!("request timed out: {}", e))
        } else {
            PlacesError::UpstreamUnavailable(e.to_string())
        }
    }
}
