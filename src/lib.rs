//! # dobby-forge
//!
//! 人设指令驱动的流式补全管线：解析指令、组装提示词、流式转发响应。
//!
//! Persona/directive-driven streaming completion pipeline for the Dobby
//! family of chat models served over an OpenAI-compatible endpoint.
//!
//! ## Overview
//!
//! A request is one raw query. The pipeline turns it into a normalized
//! [`DirectiveRecord`] (persona, style, loyalty, task, generation parameters),
//! composes a prompt from it, streams a completion from the backend and
//! relays the text to an [`OutputChannel`] chunk by chunk. Backend failures
//! never escape the relay: the caller sees the partial output, one
//! placeholder and an explicit completion signal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dobby_forge::{AppConfig, ConsoleChannel, ProfileSet, ResponseRelay, SessionContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dobby_forge::Result<()> {
//!     let client = AppConfig::from_env()?.build_client()?;
//!     let profile = ProfileSet::builtin()?.get("forge").cloned().expect("built-in");
//!     let relay = ResponseRelay::new(Arc::new(client), profile);
//!
//!     let query = r#"{"persona": "pirate", "task": "SOCIAL", "content": "self-custody"}"#;
//!     let outcome = relay
//!         .assist(&SessionContext::new("local", "1"), query, &ConsoleChannel::new())
//!         .await?;
//!     eprintln!("{:?}", outcome.state);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Completion client, builder and the [`CompletionBackend`] seam |
//! | [`pipeline`] | SSE decoding and delta extraction |
//! | [`prompt`] | Directive records and prompt composition |
//! | [`resolver`] | Raw query → directive record |
//! | [`relay`] | Streaming relay, output channels and persona profiles |
//! | [`config`] | Environment configuration |
//! | [`transport`] | HTTP transport |
//! | [`types`] | Chat message types |

pub mod client;
pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod relay;
pub mod resolver;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{
    CompletionBackend, CompletionClient, CompletionClientBuilder, GenerationParams,
    COMPLETION_FAILED_SENTINEL,
};
pub use config::AppConfig;
pub use prompt::{DirectiveRecord, PromptRequest, Task};
pub use relay::{
    ConsoleChannel, InMemoryChannel, OutputChannel, PersonaProfile, ProfileSet, RelayOutcome,
    RelayState, ResponseRelay, SessionContext, TextStream,
};
pub use resolver::DirectiveResolver;
pub use types::message::{Message, MessageRole};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
