//! Directive records and prompt composition.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`DirectiveRecord`] | Normalized persona/style/loyalty/task and generation parameters |
//! | [`Task`] | The closed set of tasks, each with an instruction template |
//! | [`build_prompt`] | Preamble + `[PERSONA=..][STYLE=..][LOYALTY=..][TASK=..]` + instruction |
//! | [`render_template`] | Placeholder rendering for fixed-directive profiles |
//!
//! ```rust
//! use dobby_forge::prompt::{build_prompt, DirectiveRecord, Task};
//!
//! let record = DirectiveRecord {
//!     task: Task::Social,
//!     content: Some("self-custody".into()),
//!     ..DirectiveRecord::default()
//! };
//! let prompt = build_prompt("You are Dobby.", &record)?;
//! assert!(prompt.contains("[TASK=SOCIAL]"));
//! # Ok::<(), dobby_forge::Error>(())
//! ```

pub mod composer;
pub mod directives;

pub use composer::{build_prompt, compose, directive_tags, instruction_template, render_template};
pub use directives::{DirectiveRecord, PromptRequest, Task};
