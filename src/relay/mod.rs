//! 响应中继：把流式补全逐块转发到输出通道，并兜住中途失败。
//!
//! Response relay: turns one query into a streamed response on an
//! [`OutputChannel`].
//!
//! | Item | Description |
//! |------|-------------|
//! | [`ResponseRelay`] | State machine `Resolving → Composing → Streaming → Completed/Failed` |
//! | [`OutputChannel`] / [`TextStream`] | The hosting layer's output seam |
//! | [`ConsoleChannel`] | stdout/stderr channel used by the CLI |
//! | [`InMemoryChannel`] | Recording channel for tests and embedding |
//! | [`PersonaProfile`] / [`ProfileSet`] | Per-persona configuration, built-ins from YAML |
//!
//! Every request ends with exactly one `close()` of its stream and one
//! `complete()` of its channel, whether it drained, failed or was abandoned.

pub mod channel;
pub mod core;
pub mod profile;

pub use self::core::{RelayOutcome, RelayState, ResponseRelay, SessionContext, ERROR_LABEL};
pub use channel::{ChannelEvent, ConsoleChannel, InMemoryChannel, OutputChannel, TextStream};
pub use profile::{
    DirectiveSource, FixedDirectives, PersonaProfile, ProfileSet, PromptShape, StatusBlock,
    DEFAULT_ERROR_PLACEHOLDER, DEFAULT_RESPONSE_LABEL,
};
