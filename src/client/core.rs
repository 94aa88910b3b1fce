use crate::client::framing::FramingMode;
use crate::client::session::{GenerationDefaults, GenerationParams, StreamSession};
use crate::client::{ChunkStream, CompletionBackend};
use crate::transport::HttpTransport;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Path of the chat-completion operation, relative to the base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Returned by [`CompletionBackend::complete`] when the backend call fails.
pub const COMPLETION_FAILED_SENTINEL: &str = "An error occurred while processing your request.";

/// Client for an OpenAI-compatible streaming chat-completion endpoint.
///
/// Holds only immutable configuration and a pooled HTTP client, so one instance
/// can serve any number of concurrent requests behind an `Arc`.
#[derive(Debug)]
pub struct CompletionClient {
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) model: String,
    pub(crate) system_prompt: String,
    pub(crate) framing: FramingMode,
    pub(crate) defaults: GenerationDefaults,
}

impl CompletionClient {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn framing(&self) -> FramingMode {
        self.framing
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Describe the call `stream_completion` would make, without sending it.
    pub fn session(&self, prompt: &str, params: GenerationParams) -> StreamSession {
        StreamSession::new(
            &self.model,
            &self.system_prompt,
            self.framing,
            prompt,
            params,
            &self.defaults,
        )
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn stream_completion(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<ChunkStream> {
        let session = self.session(prompt, params);
        info!(
            request_id = %session.request_id,
            model = %session.model,
            temperature = session.temperature,
            top_p = session.top_p,
            max_tokens = ?session.max_tokens,
            "opening completion stream"
        );

        let resp = self
            .transport
            .post_stream(
                CHAT_COMPLETIONS_PATH,
                &session.request_body(),
                &session.request_id,
            )
            .await?;

        Ok(crate::pipeline::text_chunks(
            HttpTransport::byte_stream(resp),
            session,
        ))
    }
}
