use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::errors::PlacesError;

/// Answers a question about a passage of text.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, PlacesError>;
}

#[derive(Serialize, Debug)]
struct QuestionAnsweringInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Serialize, Debug)]
struct QuestionAnsweringRequest<'a> {
    inputs: QuestionAnsweringInputs<'a>,
}

#[derive(Deserialize, Debug)]
struct QuestionAnsweringResponse {
    answer: String,
    score: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct InferenceErrorResponse {
    error: String,
}

/// Extractive question answering served by the Hugging Face inference API.
pub struct HuggingFaceScorer {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

impl HuggingFaceScorer {
    pub fn new(
        client: reqwest::Client,
        api_url: String,
        api_token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url,
            api_token,
        }
    }
}

#[async_trait]
impl Scorer for HuggingFaceScorer {
    async fn answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, PlacesError> {
        let body = QuestionAnsweringRequest {
            inputs: QuestionAnsweringInputs { question, context },
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<InferenceErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            warn!("Scorer answered with HTTP status {}: {}", status, message);
            return Err(PlacesError::UpstreamUnavailable(format!(
                "scorer returned HTTP {}: {}",
                status, message
            )));
        }

        let answer = serde_json::from_str::<QuestionAnsweringResponse>(&text).map_err(|e| {
            warn!("Failed to parse scorer response: {}. Body: {}", e, text);
            PlacesError::UpstreamUnavailable(format!("malformed scorer response: {}", e))
        })?;
        if let Some(score) = answer.score {
            tracing::debug!("Scorer picked {:?} with confidence {:.3}", answer.answer, score);
        }

        Ok(answer.answer)
    }
}
