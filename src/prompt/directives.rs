use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PERSONA: &str = "Unhinged Freedom Enthusiast";
pub const DEFAULT_STYLE: &str = "BLUNT";
pub const DEFAULT_LOYALTY: &str = "STRICT";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// Kind of output a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Task {
    Code,
    Summarize,
    Social,
}

impl Task {
    /// Task used when the input names one we do not know.
    pub const FALLBACK: Task = Task::Code;

    pub const ALL: [Task; 3] = [Task::Code, Task::Summarize, Task::Social];

    /// The directive tag value, e.g. `SOCIAL`.
    pub fn tag(self) -> &'static str {
        match self {
            Task::Code => "CODE",
            Task::Summarize => "SUMMARIZE",
            Task::Social => "SOCIAL",
        }
    }

    /// Strict, case-insensitive lookup. No fallback.
    pub fn from_tag(raw: &str) -> Option<Task> {
        let upper = raw.trim().to_uppercase();
        Task::ALL.into_iter().find(|t| t.tag() == upper)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Normalized intent of one request. Every field is always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveRecord {
    pub persona: String,
    pub style: String,
    pub loyalty: String,
    pub task: Task,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    /// Material for the SUMMARIZE/SOCIAL templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl DirectiveRecord {
    /// All defaults, with the given persona. This is the extraction-fallback record.
    pub fn persona_only(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            ..Self::default()
        }
    }
}

impl Default for DirectiveRecord {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            style: DEFAULT_STYLE.to_string(),
            loyalty: DEFAULT_LOYALTY.to_string(),
            task: Task::FALLBACK,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
            content: None,
        }
    }
}

/// Composed prompt plus the generation parameters copied from its record.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl PromptRequest {
    pub fn new(prompt: String, directives: &DirectiveRecord) -> Self {
        Self {
            prompt,
            temperature: directives.temperature,
            top_p: directives.top_p,
            max_tokens: directives.max_tokens,
        }
    }

    pub fn params(&self) -> crate::client::GenerationParams {
        crate::client::GenerationParams::new()
            .temperature(self.temperature)
            .top_p(self.top_p)
            .max_tokens(self.max_tokens)
    }
}
