//! Prompt composition. Everything here is pure: no I/O, same input, same output.

use crate::prompt::directives::{DirectiveRecord, PromptRequest, Task};
use crate::{Error, Result};

pub const CODE_INSTRUCTION: &str = "Write a Python class named `DobbyAgents` extending `AbstractAgent`. \
     Inside `assist()`, emit a single text block that reflects the assigned persona's voice.";
pub const SUMMARIZE_INSTRUCTION: &str = "Summarize the content below in Dobby's style:\n{content}";
pub const SOCIAL_INSTRUCTION: &str =
    "Write a ready-to-post social media snippet (≤280 chars) in Dobby’s voice about:\n{content}";

/// Task → instruction template. Adding a task is a new row here.
const TASK_TEMPLATES: &[(Task, &str)] = &[
    (Task::Code, CODE_INSTRUCTION),
    (Task::Summarize, SUMMARIZE_INSTRUCTION),
    (Task::Social, SOCIAL_INSTRUCTION),
];

pub fn instruction_template(task: Task) -> Result<&'static str> {
    TASK_TEMPLATES
        .iter()
        .find(|(t, _)| *t == task)
        .map(|(_, template)| *template)
        .ok_or_else(|| Error::InvalidTask(task.tag().to_string()))
}

/// `[PERSONA=x][STYLE=x][LOYALTY=x][TASK=x]`
pub fn directive_tags(directives: &DirectiveRecord) -> String {
    format!(
        "[PERSONA={}][STYLE={}][LOYALTY={}][TASK={}]",
        directives.persona,
        directives.style,
        directives.loyalty,
        directives.task.tag()
    )
}

/// Preamble, directive tags and the task instruction, separated by blank lines.
///
/// The task must already be normalized; an unknown one is an `InvalidTask` defect.
pub fn build_prompt(system_preamble: &str, directives: &DirectiveRecord) -> Result<String> {
    let template = instruction_template(directives.task)?;
    let content = directives.content.as_deref().unwrap_or("");
    let instruction = fill_placeholders(template, |key| match key {
        "content" => Some(content),
        _ => None,
    });
    Ok(format!(
        "{}\n\n{}\n\n{}",
        system_preamble,
        directive_tags(directives),
        instruction
    ))
}

pub fn compose(system_preamble: &str, directives: &DirectiveRecord) -> Result<PromptRequest> {
    let prompt = build_prompt(system_preamble, directives)?;
    Ok(PromptRequest::new(prompt, directives))
}

/// Render a profile template. Known placeholders are `{persona}`, `{style}`,
/// `{loyalty}`, `{task}`, `{content}` and `{query}`; anything else is kept as written.
pub fn render_template(template: &str, directives: &DirectiveRecord, query: &str) -> String {
    let content = directives.content.as_deref().unwrap_or("");
    fill_placeholders(template, |key| match key {
        "persona" => Some(directives.persona.as_str()),
        "style" => Some(directives.style.as_str()),
        "loyalty" => Some(directives.loyalty.as_str()),
        "task" => Some(directives.task.tag()),
        "content" => Some(content),
        "query" => Some(query),
        _ => None,
    })
}

/// Single-pass `{key}` substitution; substituted values are never re-scanned.
fn fill_placeholders<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match lookup(&after[..close]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
