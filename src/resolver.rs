//! Directive resolution: raw query text → [`DirectiveRecord`].
//!
//! Structured input (a JSON object) is used directly. Anything else is
//! treated as a natural-language description, and the completion backend is
//! asked to extract the same fields. When that fails at any point the
//! resolver falls back to a record whose persona is the whole input, which
//! can make for a poor prompt when the input is long.

use crate::client::CompletionBackend;
use crate::prompt::directives::{
    DirectiveRecord, Task, DEFAULT_LOYALTY, DEFAULT_MAX_TOKENS, DEFAULT_PERSONA, DEFAULT_STYLE,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

type FieldMap = Map<String, Value>;

pub struct DirectiveResolver {
    backend: Arc<dyn CompletionBackend>,
    preamble: String,
}

impl DirectiveResolver {
    /// `preamble` opens the extraction prompt, so the extraction call
    /// speaks in the same voice as the main request.
    pub fn new(backend: Arc<dyn CompletionBackend>, preamble: impl Into<String>) -> Self {
        Self {
            backend,
            preamble: preamble.into(),
        }
    }

    /// Resolve a query into a complete record.
    ///
    /// Only a caller-supplied structured field that cannot be coerced fails,
    /// with `InvalidDirective`. Extraction problems never surface.
    pub async fn resolve(&self, raw_input: &str) -> Result<DirectiveRecord> {
        let input = raw_input.trim();
        match parse_structured(input) {
            Some(fields) => {
                info!("parsed structured JSON input");
                normalize(&fields)
            }
            None => {
                info!("natural language input detected, extracting directives");
                Ok(self.extract(input).await)
            }
        }
    }

    async fn extract(&self, description: &str) -> DirectiveRecord {
        let prompt = extraction_prompt(&self.preamble, description);
        let response = self.backend.complete(&prompt).await;

        let Some(fields) = parse_extracted(&response) else {
            warn!("directive extraction returned no JSON object, falling back to persona-only");
            return DirectiveRecord::persona_only(description);
        };
        match normalize(&fields) {
            Ok(record) => {
                info!(
                    persona = %record.persona,
                    style = %record.style,
                    loyalty = %record.loyalty,
                    task = %record.task,
                    "directives extracted"
                );
                record
            }
            Err(e) => {
                warn!(error = %e, "extracted directives unusable, falling back to persona-only");
                DirectiveRecord::persona_only(description)
            }
        }
    }
}

/// The prompt that asks the backend to turn a description into directive JSON.
pub fn extraction_prompt(preamble: &str, description: &str) -> String {
    format!(
        "{preamble}\n\n\
         Extract the following fields from this description:\n  \
         • persona (short phrase)\n  \
         • style (e.g., BLUNT, FRIENDLY)\n  \
         • loyalty (STRICT or NEUTRAL)\n  \
         • task (CODE, SUMMARIZE, or SOCIAL)\n  \
         • temperature (0.0–1.0)\n  \
         • top_p (0.0–1.0)\n  \
         • max_tokens (integer)\n  \
         • content (the text or topic to work on, if any)\n\n\
         Description: \"{description}\"\n\n\
         Respond ONLY with valid JSON."
    )
}

/// Strict parse: the whole input must be a JSON object.
pub fn parse_structured(input: &str) -> Option<FieldMap> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Lenient parse of a model response: a bare object, a fenced block, or the
/// outermost `{...}` inside surrounding prose.
pub fn parse_extracted(response: &str) -> Option<FieldMap> {
    let trimmed = response.trim();
    if let Some(map) = parse_structured(trimmed) {
        return Some(map);
    }

    if let Some(fenced) = strip_code_fence(trimmed) {
        if let Some(map) = parse_structured(fenced) {
            return Some(map);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_structured(&trimmed[start..=end])
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix("```")?;
    // Drop the info string (```json).
    let body = &body[body.find('\n')? + 1..];
    let end = body.rfind("```")?;
    Some(body[..end].trim())
}

/// Apply defaults, normalize case and coerce types.
pub fn normalize(fields: &FieldMap) -> Result<DirectiveRecord> {
    let persona = text_field(fields, "persona")?
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PERSONA.to_string());
    let style = text_field(fields, "style")?
        .unwrap_or_else(|| DEFAULT_STYLE.to_string())
        .to_uppercase();
    let loyalty = text_field(fields, "loyalty")?
        .unwrap_or_else(|| DEFAULT_LOYALTY.to_string())
        .to_uppercase();
    let task = match text_field(fields, "task")? {
        None => Task::FALLBACK,
        Some(raw) => Task::from_tag(&raw).unwrap_or_else(|| {
            warn!(task = %raw, fallback = %Task::FALLBACK, "unknown task, using fallback");
            Task::FALLBACK
        }),
    };
    let temperature = unit_field(fields, "temperature")?.unwrap_or(DEFAULT_TEMPERATURE);
    let top_p = unit_field(fields, "top_p")?.unwrap_or(DEFAULT_TOP_P);
    let max_tokens = max_tokens_field(fields)?.unwrap_or(DEFAULT_MAX_TOKENS);
    let content = text_field(fields, "content")?.filter(|c| !c.trim().is_empty());

    Ok(DirectiveRecord {
        persona,
        style,
        loyalty,
        task,
        temperature,
        top_p,
        max_tokens,
        content,
    })
}

/// Absent and `null` are both "not supplied".
fn supplied<'a>(fields: &'a FieldMap, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn text_field(fields: &FieldMap, key: &str) -> Result<Option<String>> {
    match supplied(fields, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(v) => Err(Error::invalid_directive(key, v)),
    }
}

fn unit_field(fields: &FieldMap, key: &str) -> Result<Option<f64>> {
    let Some(v) = supplied(fields, key) else {
        return Ok(None);
    };
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
    .ok_or_else(|| Error::invalid_directive(key, v))?;

    let clamped = parsed.clamp(0.0, 1.0);
    if clamped != parsed {
        warn!(field = key, value = parsed, clamped, "directive out of range, clamped");
    }
    Ok(Some(clamped))
}

fn max_tokens_field(fields: &FieldMap) -> Result<Option<u32>> {
    const KEY: &str = "max_tokens";
    let Some(v) = supplied(fields, KEY) else {
        return Ok(None);
    };
    let as_float = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    as_float
        .filter(|f| f.is_finite() && *f >= 1.0 && *f <= u32::MAX as f64)
        .map(|f| Some(f.trunc() as u32))
        .ok_or_else(|| Error::invalid_directive(KEY, v))
}
