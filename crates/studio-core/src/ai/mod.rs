pub mod gemini;
pub mod ollama;
pub mod prompt;
pub mod proxy;

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::i18n::Locale;
use crate::proposal::Proposal;
use crate::provider::Provider;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use prompt::{build_prompt, parse_proposal_json};
pub use proxy::ProxyClient;

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("API quota exceeded")]
    QuotaExceeded { retry_after: Option<Duration> },
    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("empty response from the model")]
    Empty,
    #[error("invalid proposal JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProposalError {
    pub fn is_quota(&self) -> bool {
        matches!(self, ProposalError::QuotaExceeded { .. })
    }
}

/// Turns a project description into a [`Proposal`] using the configured
/// provider. A proxy provider without a proxy URL falls back to Gemini.
#[derive(Clone)]
pub struct ProposalGenerator {
    provider: Provider,
    model: String,
    proxy: Option<ProxyClient>,
    gemini: Option<GeminiClient>,
    ollama: OllamaClient,
}

impl ProposalGenerator {
    pub fn from_config(config: &Config) -> Self {
        let proxy = config
            .proxy_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(ProxyClient::new);
        let gemini = config
            .gemini_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(GeminiClient::new);

        Self {
            provider: config.provider(),
            model: config.model(),
            proxy,
            gemini,
            ollama: OllamaClient::new(&config.ollama_url()),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Provider that will actually serve the next request.
    pub fn effective_provider(&self) -> Provider {
        match self.provider {
            Provider::Proxy if self.proxy.is_none() => Provider::Gemini,
            other => other,
        }
    }

    pub async fn generate(&self, description: &str, locale: Locale) -> Result<Proposal, ProposalError> {
        let provider = self.effective_provider();
        info!(
            provider = provider.as_str(),
            chars = description.chars().count(),
            "generating proposal"
        );

        let result = match provider {
            Provider::Proxy => match &self.proxy {
                Some(proxy) => proxy.generate(description, locale).await,
                None => Err(ProposalError::NotConfigured("AI proxy URL")),
            },
            Provider::Gemini => match &self.gemini {
                Some(gemini) => gemini.generate(&self.model, description, locale).await,
                None => Err(ProposalError::NotConfigured("Gemini API key")),
            },
            Provider::Ollama => self
                .ollama
                .query_json(&self.model, &build_prompt(description, locale))
                .await
                .and_then(|raw| parse_proposal_json(&raw)),
        };

        match &result {
            Ok(proposal) => info!(
                phases = proposal.timeline.len(),
                sections = proposal.sections.len(),
                "proposal generated"
            ),
            Err(e) => warn!(error = %e, "proposal generation failed"),
        }
        result
    }
}
