use crate::client::core::CompletionClient;
use crate::client::framing::FramingMode;
use crate::client::session::GenerationDefaults;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";
pub const DEFAULT_MODEL: &str = "accounts/sentientfoundation/models/dobby-unhinged-llama-3-3-70b-new";
/// System prompt value that selects the dated helpful-assistant prompt.
pub const DEFAULT_SYSTEM_PROMPT_KEY: &str = "default";

/// Builder for creating a [`CompletionClient`].
///
/// Keep this surface area small and predictable.
pub struct CompletionClientBuilder {
    api_key: Option<String>,
    base_url: String,
    model: String,
    system_prompt: Option<String>,
    framing: Option<FramingMode>,
    defaults: GenerationDefaults,
}

impl CompletionClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            framing: None,
            defaults: GenerationDefaults::default(),
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Base URL of the OpenAI-compatible API (the part before `/chat/completions`).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Custom system prompt. `"default"` keeps the built-in dated prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Override the framing mode the model table would pick.
    pub fn framing(mut self, mode: FramingMode) -> Self {
        self.framing = Some(mode);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.defaults.temperature = temp;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CompletionClient> {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API key is empty",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_source("client_builder"),
                )
            })?;

        validate_base_url(&self.base_url)?;

        let system_prompt = match self.system_prompt.as_deref() {
            None | Some(DEFAULT_SYSTEM_PROMPT_KEY) => default_system_prompt(),
            Some(custom) => custom.to_string(),
        };
        let framing = self
            .framing
            .unwrap_or_else(|| FramingMode::for_model(&self.model));

        let transport = Arc::new(HttpTransport::new(&self.base_url, &api_key)?);

        Ok(CompletionClient {
            transport,
            model: self.model,
            system_prompt,
            framing,
            defaults: self.defaults,
        })
    }
}

impl Default for CompletionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_base_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid endpoint URL: {}", e),
            ErrorContext::new()
                .with_field_path("base_url")
                .with_details(raw)
                .with_source("client_builder"),
        )
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::configuration_with_context(
            format!("unsupported endpoint scheme `{}`", other),
            ErrorContext::new()
                .with_field_path("base_url")
                .with_details(raw)
                .with_source("client_builder"),
        )),
    }
}

/// The dated helpful-assistant system prompt.
pub fn default_system_prompt() -> String {
    let date_today = chrono::Local::now().format("%Y-%m-%d");
    format!(
        "You are a helpful assistant that can answer questions and provide information. \
         Today’s date is: {}. Keep responses clear, concise, and helpful.",
        date_today
    )
}
