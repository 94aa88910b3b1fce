//! Startup configuration from the environment (and `.env`).

use crate::client::builder::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT_KEY};
use crate::client::{CompletionClient, CompletionClientBuilder};
use crate::{Error, ErrorContext, Result};
use std::fmt;

pub const API_KEY_VAR: &str = "MODEL_API_KEY";
pub const BASE_URL_VAR: &str = "MODEL_BASE_URL";
pub const MODEL_VAR: &str = "MODEL_ID";
pub const SYSTEM_PROMPT_VAR: &str = "MODEL_SYSTEM_PROMPT";
pub const TEMPERATURE_VAR: &str = "MODEL_TEMPERATURE";

#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// `"default"` selects the dated default system prompt.
    pub system_prompt: String,
    pub temperature: f64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var(API_KEY_VAR).ok_or_else(|| {
            Error::configuration_with_context(
                format!("{API_KEY_VAR} is not set"),
                ErrorContext::new()
                    .with_field_path(API_KEY_VAR)
                    .with_source("environment"),
            )
        })?;

        let temperature = match var(TEMPERATURE_VAR) {
            None => 0.0,
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite())
                .ok_or_else(|| {
                    Error::configuration_with_context(
                        format!("{TEMPERATURE_VAR} is not a number"),
                        ErrorContext::new()
                            .with_field_path(TEMPERATURE_VAR)
                            .with_details(raw.clone())
                            .with_source("environment"),
                    )
                })?,
        };

        Ok(Self {
            api_key,
            base_url: var(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: var(SYSTEM_PROMPT_VAR)
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT_KEY.to_string()),
            temperature,
        })
    }

    pub fn client_builder(&self) -> CompletionClientBuilder {
        CompletionClientBuilder::new()
            .api_key(&self.api_key)
            .base_url(&self.base_url)
            .model(&self.model)
            .system_prompt(&self.system_prompt)
            .temperature(self.temperature)
    }

    pub fn build_client(&self) -> Result<CompletionClient> {
        self.client_builder().build()
    }
}
