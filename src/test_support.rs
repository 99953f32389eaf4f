use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use axum::Router;
use crate::controller::AppState;
use crate::errors::PlacesError;
use crate::helpers::auth::AuthSettings;
use crate::models::coordinate::Coordinate;
use crate::models::place::{Candidate, RankedCandidate};
use crate::repositories::memory_repo::MemoryRepo;
use crate::services::mailer::Mailer;
use crate::services::place_locator::{LocatorConfig, PlaceLocator};
use crate::services::places_directory::{DirectoryResponse, PlacesDirectory};
use crate::services::recommendation::{ComposerConfig, RecommendationComposer};
use crate::services::scorer::Scorer;

pub const ORIGIN: Coordinate = Coordinate {
    lat: 49.224090,
    lng: -123.063501,
};

fn meters_per_degree_latitude(lat: f64) -> f64 {
    let phi = lat.to_radians();
    111_132.954 - 559.822 * (2.0 * phi).cos() + 1.175 * (4.0 * phi).cos()
}

/// A candidate roughly `meters` due north of `ORIGIN`.
pub fn candidate_north_of(
    name: &str,
    meters: f64,
    rating: Option<f64>,
) -> Candidate {
    let lat = ORIGIN.lat + meters / meters_per_degree_latitude(ORIGIN.lat);
    Candidate {
        name: name.to_string(),
        coordinate: Coordinate::new(lat, ORIGIN.lng),
        address: format!("{} address", name),
        rating,
        place_id: format!("place-{}", name),
    }
}

pub fn ranked_candidate(
    name: &str,
    rating: f64,
    distance: f64,
) -> RankedCandidate {
    RankedCandidate {
        name: name.to_string(),
        address: format!("{} address", name),
        distance,
        rating,
        url: format!("https://www.google.com/maps/place/?q=place_id:place-{}", name),
        latitude: ORIGIN.lat,
        longitude: ORIGIN.lng,
        place_id: format!("place-{}", name),
    }
}

enum CannedDirectory {
    Places(Vec<Candidate>),
    ZeroResults,
    Fail(PlacesError),
}

pub struct StubDirectory {
    canned: CannedDirectory,
    delay: Option<Duration>,
    calls: Mutex<Vec<(Coordinate, f64, String)>>,
}

impl StubDirectory {
    fn with(canned: CannedDirectory) -> Self {
        Self {
            canned,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn places(candidates: Vec<Candidate>) -> Self {
        Self::with(CannedDirectory::Places(candidates))
    }

    pub fn zero_results() -> Self {
        Self::with(CannedDirectory::ZeroResults)
    }

    pub fn failing(error: PlacesError) -> Self {
        Self::with(CannedDirectory::Fail(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(Coordinate, f64, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesDirectory for StubDirectory {
    async fn nearby_search(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        place_type: &str,
    ) -> Result<DirectoryResponse, PlacesError> {
        self.calls
            .lock()
            .unwrap()
            .push((origin, radius_meters, place_type.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.canned {
            CannedDirectory::Places(candidates) => Ok(DirectoryResponse::Places(candidates.clone())),
            CannedDirectory::ZeroResults => Ok(DirectoryResponse::ZeroResults),
            CannedDirectory::Fail(error) => Err(error.clone()),
        }
    }
}

pub struct StubScorer {
    answer: Result<String, PlacesError>,
    delay: Option<Duration>,
    questions: Mutex<Vec<(String, String)>>,
}

impl StubScorer {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            delay: None,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: PlacesError) -> Self {
        Self {
            answer: Err(error),
            delay: None,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn questions(&self) -> Vec<(String, String)> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scorer for StubScorer {
    async fn answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, PlacesError> {
        self.questions
            .lock()
            .unwrap()
            .push((question.to_string(), context.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), text.to_string()));
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(
        &self,
        _to: &str,
        _subject: &str,
        _text: &str,
    ) -> anyhow::Result<()> {
        anyhow::bail!("mail relay refused the connection")
    }
}

pub fn test_auth_settings() -> AuthSettings {
    AuthSettings {
        secret_key: "test-secret".to_string(),
        reset_password_secret_key: "test-reset-secret".to_string(),
        access_token_expire_minutes: 30,
        reset_password_expire_minutes: 15,
        password_hash_cost: 4,
        secure_cookies: false,
        free_api_calls: 20,
        frontend_url: "http://localhost:5500".to_string(),
    }
}

pub struct TestApp {
    pub state: AppState,
    pub repo: Arc<MemoryRepo>,
    pub directory: Arc<StubDirectory>,
    pub scorer: Arc<StubScorer>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_app(
    directory: StubDirectory,
    scorer: StubScorer,
) -> TestApp {
    let repo = Arc::new(MemoryRepo::default());
    let directory = Arc::new(directory);
    let scorer = Arc::new(scorer);
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState {
        repo: repo.clone(),
        locator: Arc::new(PlaceLocator::new(directory.clone(), LocatorConfig::default())),
        composer: Arc::new(RecommendationComposer::new(scorer.clone(), ComposerConfig::default())),
        mailer: mailer.clone(),
        auth: Arc::new(test_auth_settings()),
    };

    TestApp {
        state,
        repo,
        directory,
        scorer,
        mailer,
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub fn spawn_upstream(router: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(router.into_make_service())
            .await
            .unwrap();
    });
    format!("http://{}", address)
}
