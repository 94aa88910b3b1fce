//! Persona profiles: the per-persona configuration the relay runs with.
//!
//! A profile either derives its directives from the query or carries a fixed
//! set, and either composes the directive-tag prompt or renders its own
//! template. Profile text is configuration data; the built-ins are the YAML in
//! `profiles/builtin.yaml`.

use crate::prompt::{DirectiveRecord, Task};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_RESPONSE_LABEL: &str = "FINAL_RESPONSE";
pub const DEFAULT_ERROR_PLACEHOLDER: &str = "Error generating response.";

const BUILTIN_PROFILES: &str = include_str!("../../profiles/builtin.yaml");

/// A discrete announcement sent before the response stream opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBlock {
    pub label: String,
    pub text: String,
}

/// Directives a fixed profile always uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedDirectives {
    pub persona: String,
    pub style: String,
    pub loyalty: String,
    /// Task tag, parsed strictly when the profile is used.
    pub task: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl FixedDirectives {
    /// The record for one request. `content` carries the query.
    ///
    /// An unknown task tag is `InvalidTask`: a broken profile, not bad input.
    pub fn record(&self, content: Option<String>) -> Result<DirectiveRecord> {
        let task =
            Task::from_tag(&self.task).ok_or_else(|| Error::InvalidTask(self.task.clone()))?;
        Ok(DirectiveRecord {
            persona: self.persona.clone(),
            style: self.style.clone(),
            loyalty: self.loyalty.clone(),
            task,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            content,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DirectiveSource {
    #[default]
    FromInput,
    Fixed(FixedDirectives),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PromptShape {
    /// Preamble, directive tags and the task instruction.
    #[default]
    Directive,
    /// A profile template rendered with the record and the raw query.
    Template { template: String },
}

fn default_response_label() -> String {
    DEFAULT_RESPONSE_LABEL.to_string()
}

fn default_error_placeholder() -> String {
    DEFAULT_ERROR_PLACEHOLDER.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Opens directive-shaped prompts and the extraction prompt.
    #[serde(default)]
    pub preamble: String,
    #[serde(default)]
    pub directives: DirectiveSource,
    #[serde(default)]
    pub prompt: PromptShape,
    #[serde(default)]
    pub status_block: Option<StatusBlock>,
    #[serde(default = "default_response_label")]
    pub response_label: String,
    #[serde(default = "default_error_placeholder")]
    pub error_placeholder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    pub profiles: Vec<PersonaProfile>,
}

impl ProfileSet {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_PROFILES)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn get(&self, name: &str) -> Option<&PersonaProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    /// Add `other`'s profiles; a profile with an existing name replaces it.
    pub fn merge(&mut self, other: ProfileSet) {
        for profile in other.profiles {
            match self.profiles.iter_mut().find(|p| p.name == profile.name) {
                Some(existing) => *existing = profile,
                None => self.profiles.push(profile),
            }
        }
    }
}
