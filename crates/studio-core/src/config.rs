use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::provider::Provider;
use crate::i18n::Locale;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub proxy_url: Option<String>,
    pub ollama_url: Option<String>,
    pub locale: Option<String>,
    pub database_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some("proxy".to_string()),
            ..Default::default()
        }
    }

    /// Load from the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// `GEMINI_API_KEY`, `GEMINI_MODEL` and `STUDIO_AI_PROXY_URL` win over
    /// the file.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            self.default_model = Some(model);
        }
        if let Some(url) = non_empty("STUDIO_AI_PROXY_URL") {
            self.proxy_url = Some(url);
        }
    }

    /// Unknown provider names fall back to the proxy.
    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Proxy)
    }

    pub fn locale(&self) -> Locale {
        self.locale
            .as_deref()
            .and_then(Locale::from_str)
            .unwrap_or_default()
    }

    pub fn model(&self) -> String {
        if let Some(model) = &self.default_model {
            return model.clone();
        }
        match self.provider() {
            Provider::Ollama => DEFAULT_OLLAMA_MODEL.to_string(),
            Provider::Proxy | Provider::Gemini => DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    pub fn ollama_url(&self) -> String {
        self.ollama_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => {
                let data_dir = dirs::data_dir()
                    .ok_or_else(|| anyhow!("Could not determine data directory"))?;
                Ok(data_dir.join("suaiden-studio").join("sessions.db"))
            }
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("suaiden-studio").join("config.json"))
    }
}
