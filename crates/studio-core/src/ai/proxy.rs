use reqwest::Client;
use serde::Serialize;

use crate::i18n::Locale;
use crate::proposal::Proposal;

use super::{build_prompt, parse_proposal_json, ProposalError};

#[derive(Serialize)]
struct ProxyRequest<'a> {
    description: &'a str,
    locale: Locale,
    prompt: String,
}

/// Server-side relay that holds the model credentials. It receives the
/// already-guarded prompt so it can forward it as is.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/generate", self.base_url)
    }

    pub async fn generate(&self, description: &str, locale: Locale) -> Result<Proposal, ProposalError> {
        let request = ProxyRequest {
            description,
            locale,
            prompt: build_prompt(description, locale),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProposalError::QuotaExceeded { retry_after: None });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProposalError::Status {
                provider: "proxy",
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        parse_proposal_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_slash() {
        assert_eq!(
            ProxyClient::new("https://api.example.com/").endpoint(),
            "https://api.example.com/generate"
        );
    }

    #[test]
    fn test_request_body() {
        let request = ProxyRequest {
            description: "Shop",
            locale: Locale::Pt,
            prompt: build_prompt("Shop", Locale::Pt),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["description"], "Shop");
        assert_eq!(value["locale"], "pt");
        assert!(value["prompt"].as_str().unwrap().ends_with("Shop"));
    }
}
