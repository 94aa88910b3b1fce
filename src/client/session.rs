use crate::client::framing::FramingMode;
use crate::types::Message;
use serde_json::{json, Value};
use uuid::Uuid;

/// Per-call generation parameters. `None` falls back to the client defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Client-level defaults applied when a call leaves a parameter unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationDefaults {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: None,
        }
    }
}

/// One in-flight streaming call.
///
/// Built by the client for every `stream_completion`, then moved into the
/// returned chunk stream; it is never shared or reused.
#[derive(Debug, Clone)]
pub struct StreamSession {
    pub request_id: String,
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: Option<u32>,
}

impl StreamSession {
    pub fn new(
        model: &str,
        system_prompt: &str,
        framing: FramingMode,
        prompt: &str,
        params: GenerationParams,
        defaults: &GenerationDefaults,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
            messages: framing.frame(system_prompt, prompt),
            temperature: params.temperature.unwrap_or(defaults.temperature),
            top_p: params.top_p.unwrap_or(defaults.top_p),
            max_tokens: params.max_tokens.or(defaults.max_tokens),
        }
    }

    /// OpenAI-compatible request body. `max_tokens` is omitted when unset.
    pub fn request_body(&self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
            "temperature": self.temperature,
            "top_p": self.top_p,
            "stream": true,
        });
        if let Some(max) = self.max_tokens {
            body["max_tokens"] = json!(max);
        }
        body
    }
}
