use crate::batch::DEFAULT_BATCH_SIZE;
use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,
    pub temperature: f32,

    // Batching
    pub batch_size: usize,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let openai_api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        if openai_api_key.trim().is_empty() {
            anyhow::bail!("OPENAI_API_KEY is empty");
        }

        Ok(Self {
            openai_api_key,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            temperature: std::env::var("TRANSLATION_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.3),

            batch_size: std::env::var("TRANSLATION_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
            request_timeout_secs: std::env::var("OPENAI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        })
    }

    /// Apply command-line overrides on top of environment values
    pub fn with_overrides(
        mut self,
        endpoint: Option<&str>,
        model: Option<&str>,
        batch_size: Option<usize>,
    ) -> Self {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.openai_api_url = endpoint.trim().to_string();
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.openai_model = model.trim().to_string();
        }
        if let Some(batch_size) = batch_size {
            self.batch_size = batch_size;
        }
        self
    }
}
