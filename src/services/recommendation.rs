use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::errors::PlacesError;
use crate::models::place::{RankedCandidate, Recommendation};
use crate::services::scorer::Scorer;

#[derive(Clone, Debug)]
pub struct ComposerConfig {
    pub timeout: Duration,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct RecommendationComposer {
    scorer: Arc<dyn Scorer>,
    config: ComposerConfig,
}

impl RecommendationComposer {
    pub fn new(
        scorer: Arc<dyn Scorer>,
        config: ComposerConfig,
    ) -> Self {
        Self {
            scorer,
            config,
        }
    }

    /// Asks the scorer to pick one of `candidates`.
    ///
    /// The answer is passed through as-is apart from trimming; use
    /// `Recommendation::matched_candidate` to tie it back to a place.
    pub async fn recommend(
        &self,
        candidates: &[RankedCandidate],
        place_type: &str,
    ) -> Result<Recommendation, PlacesError> {
        if candidates.is_empty() {
            return Err(PlacesError::NoCandidates);
        }

        let question = build_question(place_type);
        let context = build_context(candidates, place_type);

        let answer = tokio::time::timeout(self.config.timeout, self.scorer.answer(&question, &context))
            .await
            .map_err(|_| {
                warn!("Scorer did not answer within {:?}", self.config.timeout);
                PlacesError::RecommendationUnavailable(format!(
                    "scorer timed out after {}s",
                    self.config.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| {
                warn!("Scorer failed: {}", e);
                PlacesError::RecommendationUnavailable(e.to_string())
            })?;

        let chosen_name = answer.trim().to_string();
        info!("Scorer recommended {:?} among {} {}", chosen_name, candidates.len(), place_type);

        Ok(Recommendation {
            candidates: candidates.to_vec(),
            chosen_name,
        })
    }
}

pub fn build_question(place_type: &str) -> String {
    format!(
        "Which location is the best option? The highest-rated {} among the following options should be selected.",
        place_type
    )
}

pub fn build_context(
    candidates: &[RankedCandidate],
    place_type: &str,
) -> String {
    let listing: String = candidates
        .iter()
        .map(|candidate| {
            format!(
                "- {} with a rating of {} and is {:.2} metres away.\n",
                candidate.name, candidate.rating, candidate.distance
            )
        })
        .collect();
    format!(
        "There are several {} including:\n{}The best {} to visit has a large rating.",
        place_type, listing, place_type
    )
}
