use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to send request to Gemini API: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Gemini API rate limit exceeded")]
    RateLimited,
    #[error("Gemini API error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to parse Gemini API response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Something that turns a prompt into a free-text completion.
pub trait CompletionModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

const UNREADABLE_BODY: &str = "<unreadable body>";

fn error_body(body: Result<String, reqwest::Error>) -> String {
    body.unwrap_or_else(|err| {
        log::debug!("Failed to read Gemini error body: {err}");
        UNREADABLE_BODY.to_owned()
    })
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
        }
    }
}

impl CompletionModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: 1024,
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(ModelError::Transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }
        if !status.is_success() {
            let body = error_body(response.text().await);
            return Err(ModelError::Status { status, body });
        }

        let api_response: GenerateContentResponse =
            response.json().await.map_err(ModelError::Decode)?;

        Ok(api_response.into_text())
    }
}
