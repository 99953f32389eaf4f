use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use crate::errors::PlacesError;
use crate::models::coordinate::Coordinate;
use crate::models::place::{Candidate, LocateOutcome, RankedCandidate, SearchRequest};
use crate::services::places_directory::{DirectoryResponse, PlacesDirectory};

#[derive(Clone, Debug)]
pub struct LocatorConfig {
    /// Added to the walking distance before asking the directory, since its
    /// radius is a hard cutoff rather than a target.
    pub padding_meters: f64,
    /// Slack beyond the search radius when filtering by measured distance.
    pub tolerance_meters: f64,
    pub max_results: usize,
    pub timeout: Duration,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            padding_meters: 100.0,
            tolerance_meters: 100.0,
            max_results: 3,
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct PlaceLocator {
    directory: Arc<dyn PlacesDirectory>,
    config: LocatorConfig,
}

impl PlaceLocator {
    pub fn new(
        directory: Arc<dyn PlacesDirectory>,
        config: LocatorConfig,
    ) -> Self {
        Self {
            directory,
            config,
        }
    }

    pub fn search_radius(&self, request: &SearchRequest) -> f64 {
        request.search_radius(self.config.padding_meters)
    }

    pub async fn locate(
        &self,
        request: &SearchRequest,
    ) -> Result<LocateOutcome, PlacesError> {
        let search_radius = self.search_radius(request);
        debug!(
            "Locating {} within {:.2}m of ({}, {})",
            request.place_type, search_radius, request.origin.lat, request.origin.lng
        );

        let directory_res = tokio::time::timeout(
            self.config.timeout,
            self.directory.nearby_search(request.origin, search_radius, &request.place_type),
        )
        .await
        .map_err(|_| {
            warn!("Places directory did not answer within {:?}", self.config.timeout);
            PlacesError::UpstreamUnavailable(format!(
                "places directory timed out after {}s",
                self.config.timeout.as_secs_f64()
            ))
        })??;

        let candidates = match directory_res {
            DirectoryResponse::Places(candidates) => candidates,
            DirectoryResponse::ZeroResults => {
                info!("Places directory returned no {} near the origin", request.place_type);
                return Ok(LocateOutcome::NoResults);
            }
        };

        let returned = candidates.len();
        let ranked = filter_and_rank(request.origin, candidates, search_radius, &self.config);
        info!(
            "Kept {} of {} {} candidates within {:.2}m",
            ranked.len(),
            returned,
            request.place_type,
            search_radius
        );

        if ranked.is_empty() {
            return Ok(LocateOutcome::NoResults);
        }
        Ok(LocateOutcome::Found(ranked))
    }
}

/// Drops unrated and out of range candidates, then keeps the best rated
/// `max_results`. Ties keep the directory's order.
pub fn filter_and_rank(
    origin: Coordinate,
    candidates: Vec<Candidate>,
    search_radius: f64,
    config: &LocatorConfig,
) -> Vec<RankedCandidate> {
    let limit = search_radius + config.tolerance_meters;

    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let rating = candidate.rating.filter(|r| r.is_finite())?;
            let distance = origin.geodesic_distance_to(&candidate.coordinate);
            if distance > limit {
                return None;
            }

            Some(RankedCandidate {
                url: deep_link(&candidate.place_id),
                name: candidate.name,
                address: candidate.address,
                distance,
                rating,
                latitude: candidate.coordinate.lat,
                longitude: candidate.coordinate.lng,
                place_id: candidate.place_id,
            })
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked.truncate(config.max_results);
    ranked
}

pub fn deep_link(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{}", place_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candidate_north_of, StubDirectory, ORIGIN};

    fn park_request(height: f64, steps: i64) -> SearchRequest {
        SearchRequest::new(ORIGIN, height, steps, "park").unwrap()
    }

    fn locator(directory: StubDirectory) -> (PlaceLocator, Arc<StubDirectory>) {
        let directory = Arc::new(directory);
        (PlaceLocator::new(directory.clone(), LocatorConfig::default()), directory)
    }

    #[tokio::test]
    async fn walking_scenario_keeps_nearby_parks_by_rating() {
        let (locator, directory) = locator(StubDirectory::places(vec![
            candidate_north_of("Near Park", 400.0, Some(4.2)),
            candidate_north_of("Middle Park", 600.0, Some(4.4)),
            candidate_north_of("Far Park", 1500.0, Some(4.9)),
        ]));

        let outcome = locator.locate(&park_request(180.0, 1000)).await.unwrap();
        let ranked = match outcome {
            LocateOutcome::Found(ranked) => ranked,
            LocateOutcome::NoResults => panic!("expected results"),
        };

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Middle Park");
        assert_eq!(ranked[0].rating, 4.4);
        assert!((ranked[0].distance - 600.0).abs() < 2.0);
        assert_eq!(ranked[1].name, "Near Park");
        assert_eq!(ranked[1].rating, 4.2);
        assert!((ranked[1].distance - 400.0).abs() < 2.0);

        let calls = directory.calls();
        assert_eq!(calls.len(), 1);
        assert!((calls[0].1 - 820.0).abs() < 1e-9);
        assert_eq!(calls[0].2, "park");
    }

    #[tokio::test]
    async fn zero_results_status_is_no_results() {
        let (locator, _) = locator(StubDirectory::zero_results());
        let outcome = locator.locate(&park_request(170.0, 500)).await.unwrap();
        assert_eq!(outcome, LocateOutcome::NoResults);
    }

    #[tokio::test]
    async fn all_unrated_is_no_results() {
        let (locator, _) = locator(StubDirectory::places(vec![
            candidate_north_of("Unrated A", 100.0, None),
            candidate_north_of("Unrated B", 200.0, None),
        ]));
        let outcome = locator.locate(&park_request(170.0, 500)).await.unwrap();
        assert_eq!(outcome, LocateOutcome::NoResults);
    }

    #[tokio::test]
    async fn directory_failures_propagate() {
        let (unavailable, _) = locator(StubDirectory::failing(PlacesError::UpstreamUnavailable(
            "connection refused".to_string(),
        )));
        assert!(matches!(
            unavailable.locate(&park_request(170.0, 500)).await,
            Err(PlacesError::UpstreamUnavailable(_))
        ));

        let (rejected, _) = locator(StubDirectory::failing(PlacesError::UpstreamRejected(
            "The provided API key is invalid.".to_string(),
        )));
        assert_eq!(
            rejected.locate(&park_request(170.0, 500)).await,
            Err(PlacesError::UpstreamRejected("The provided API key is invalid.".to_string()))
        );
    }

    #[tokio::test]
    async fn slow_directory_times_out() {
        let directory = Arc::new(StubDirectory::places(vec![]).with_delay(Duration::from_millis(500)));
        let config = LocatorConfig {
            timeout: Duration::from_millis(20),
            ..LocatorConfig::default()
        };
        let locator = PlaceLocator::new(directory, config);
        assert!(matches!(
            locator.locate(&park_request(170.0, 500)).await,
            Err(PlacesError::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn same_inputs_same_ranking() {
        let (locator, _) = locator(StubDirectory::places(vec![
            candidate_north_of("A", 100.0, Some(4.0)),
            candidate_north_of("B", 150.0, Some(4.5)),
            candidate_north_of("C", 200.0, Some(4.0)),
            candidate_north_of("D", 250.0, Some(3.1)),
        ]));
        let request = park_request(170.0, 500);
        let first = locator.locate(&request).await.unwrap();
        let second = locator.locate(&request).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn keeps_at_most_three_in_rating_order() {
        let candidates = vec![
            candidate_north_of("A", 100.0, Some(3.9)),
            candidate_north_of("B", 120.0, Some(4.8)),
            candidate_north_of("C", 140.0, Some(4.1)),
            candidate_north_of("D", 160.0, Some(4.5)),
            candidate_north_of("E", 180.0, Some(2.0)),
        ];
        let ranked = filter_and_rank(ORIGIN, candidates, 500.0, &LocatorConfig::default());
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "D", "C"]);
        assert!(ranked.windows(2).all(|w| w[0].rating >= w[1].rating));
    }

    #[test]
    fn equal_ratings_keep_directory_order() {
        let candidates = vec![
            candidate_north_of("First", 300.0, Some(4.0)),
            candidate_north_of("Second", 100.0, Some(4.0)),
            candidate_north_of("Third", 200.0, Some(4.0)),
        ];
        let ranked = filter_and_rank(ORIGIN, candidates, 500.0, &LocatorConfig::default());
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn tolerance_extends_the_radius() {
        let config = LocatorConfig::default();
        let candidates = vec![
            candidate_north_of("Inside tolerance", 580.0, Some(4.0)),
            candidate_north_of("Outside tolerance", 620.0, Some(5.0)),
        ];
        let ranked = filter_and_rank(ORIGIN, candidates, 500.0, &config);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Inside tolerance");
        assert!(ranked.iter().all(|c| c.distance <= 500.0 + config.tolerance_meters));
    }

    #[test]
    fn unrated_candidates_never_survive() {
        let candidates = vec![
            candidate_north_of("Rated", 50.0, Some(1.0)),
            candidate_north_of("Unrated", 10.0, None),
            candidate_north_of("Broken", 10.0, Some(f64::NAN)),
        ];
        let ranked = filter_and_rank(ORIGIN, candidates, 500.0, &LocatorConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Rated");
    }

    #[test]
    fn attaches_deep_link() {
        let ranked = filter_and_rank(
            ORIGIN,
            vec![candidate_north_of("Linked", 50.0, Some(4.0))],
            500.0,
            &LocatorConfig::default(),
        );
        assert_eq!(
            ranked[0].url,
            "https://www.google.com/maps/place/?q=place_id:place-Linked"
        );
    }
}
