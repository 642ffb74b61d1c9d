use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::i18n::Locale;
use crate::proposal::Proposal;

use super::{build_prompt, parse_proposal_json, ProposalError};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const RETRY_INFO_TYPE: &str = "type.googleapis.com/google.rpc.RetryInfo";

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "retryDelay")]
    retry_delay: Option<String>,
}

/// Server-suggested wait from a 429 body, e.g. `"retryDelay": "17s"`.
pub fn parse_retry_delay(body: &str) -> Option<Duration> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let delay = envelope
        .error
        .details
        .into_iter()
        .find(|d| d.kind == RETRY_INFO_TYPE)?
        .retry_delay?;

    let seconds: f64 = delay.trim().trim_end_matches('s').parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

fn request_body(prompt: String) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: 0.6,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 2048,
            response_mime_type: "application/json".to_string(),
        },
    }
}

fn first_text(response: GeminiResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|p| p.text)
}

enum Attempt {
    Done(Result<Proposal, ProposalError>),
    Quota(Option<Duration>),
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
        }
    }

    /// Generate a proposal. On HTTP 429 with a server-supplied retry delay
    /// the request is retried once after that delay.
    pub async fn generate(
        &self,
        model: &str,
        description: &str,
        locale: Locale,
    ) -> Result<Proposal, ProposalError> {
        let request = request_body(build_prompt(description, locale));

        match self.attempt(model, &request).await? {
            Attempt::Done(result) => result,
            Attempt::Quota(None) => Err(ProposalError::QuotaExceeded { retry_after: None }),
            Attempt::Quota(Some(delay)) => {
                info!(delay_secs = delay.as_secs_f64(), "Gemini quota hit, retrying once");
                tokio::time::sleep(delay).await;
                match self.attempt(model, &request).await? {
                    Attempt::Done(result) => result,
                    Attempt::Quota(retry_after) => {
                        warn!("Gemini quota still exceeded after retry");
                        Err(ProposalError::QuotaExceeded { retry_after })
                    }
                }
            }
        }
    }

    async fn attempt(&self, model: &str, request: &GeminiRequest) -> Result<Attempt, ProposalError> {
        let url = format!("{}/{}:generateContent", API_BASE, model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Quota(parse_retry_delay(&body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Done(Err(ProposalError::Status {
                provider: "gemini",
                status: status.as_u16(),
                body,
            })));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let result = match first_text(gemini_response) {
            Some(text) => parse_proposal_json(&text),
            None => Err(ProposalError::Empty),
        };
        Ok(Attempt::Done(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_generation_config() {
        let value = serde_json::to_value(request_body("hi".to_string())).unwrap();
        let config = &value["generationConfig"];
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 2048);
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_parse_retry_delay() {
        let body = r#"{"error": {"code": 429, "details": [
            {"@type": "type.googleapis.com/google.rpc.QuotaFailure"},
            {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "17s"}
        ]}}"#;
        assert_eq!(parse_retry_delay(body), Some(Duration::from_secs(17)));
        assert_eq!(parse_retry_delay(r#"{"error": {"details": []}}"#), None);
        assert_eq!(parse_retry_delay("not json"), None);
    }

    #[test]
    fn test_parse_retry_delay_out_of_range() {
        let delay = |value: &str| {
            format!(
                r#"{{"error": {{"details": [{{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "{}"}}]}}}}"#,
                value
            )
        };
        assert_eq!(parse_retry_delay(&delay("1e300s")), None);
        assert_eq!(parse_retry_delay(&delay("-5s")), None);
        assert_eq!(parse_retry_delay(&delay("1.5s")), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_first_text() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"title\": \"X\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(response).as_deref(), Some("{\"title\": \"X\"}"));

        let empty: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_text(empty), None);
    }
}
