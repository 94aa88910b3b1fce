//! Completion client for the remote chat-completion backend.
//!
//! The public surface is the [`CompletionBackend`] trait, implemented by
//! [`CompletionClient`]. Resolver and relay only see the trait, so tests and
//! embedders can substitute their own backend.

pub mod builder;
pub mod core;
pub mod framing;
pub mod session;

pub use builder::{default_system_prompt, CompletionClientBuilder};
pub use self::core::{CompletionClient, COMPLETION_FAILED_SENTINEL};
pub use framing::FramingMode;
pub use session::{GenerationDefaults, GenerationParams, StreamSession};

use crate::{BoxStream, Result};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::error;

/// Lazy, finite, non-restartable stream of generated text chunks.
pub type ChunkStream = BoxStream<'static, String>;

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Open a streaming completion.
    ///
    /// Fails with `BackendUnavailable` before yielding anything if the call
    /// cannot be established. A failure after that is yielded once as
    /// `StreamInterrupted` and ends the stream.
    async fn stream_completion(&self, prompt: &str, params: GenerationParams)
        -> Result<ChunkStream>;

    /// Drain a default-parameter stream and concatenate its chunks.
    async fn try_complete(&self, prompt: &str) -> Result<String> {
        let mut stream = self
            .stream_completion(prompt, GenerationParams::default())
            .await?;
        let mut response = String::new();
        while let Some(chunk) = stream.next().await {
            response.push_str(&chunk?);
        }
        Ok(response)
    }

    /// Like [`try_complete`](Self::try_complete), but a failure becomes
    /// [`COMPLETION_FAILED_SENTINEL`].
    async fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "error while processing completion");
                COMPLETION_FAILED_SENTINEL.to_string()
            }
        }
    }
}
