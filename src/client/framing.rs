//! 消息封装方式：按模型能力选择 system+user 或合并为单条 user 消息。
//!
//! Message framing by backend capability.

use crate::types::Message;
use serde::{Deserialize, Serialize};

/// How the system prompt and the user prompt are laid out in `messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// `[system, user]`, for models with system-role support.
    SystemAndUser,
    /// A single user message carrying both, for models without a system role.
    MergedUser,
}

/// Models that reject the system role. Every other model uses [`FramingMode::SystemAndUser`].
const FRAMING_TABLE: &[(&str, FramingMode)] = &[
    ("o1-preview", FramingMode::MergedUser),
    ("o1-mini", FramingMode::MergedUser),
];

impl FramingMode {
    pub fn for_model(model: &str) -> Self {
        FRAMING_TABLE
            .iter()
            .find(|(id, _)| *id == model)
            .map(|(_, mode)| *mode)
            .unwrap_or(FramingMode::SystemAndUser)
    }

    pub fn frame(self, system_prompt: &str, prompt: &str) -> Vec<Message> {
        match self {
            FramingMode::SystemAndUser => {
                vec![Message::system(system_prompt), Message::user(prompt)]
            }
            FramingMode::MergedUser => vec![Message::user(format!(
                "System Instruction: {}\n Instruction: {}",
                system_prompt, prompt
            ))],
        }
    }
}
