//! Mock HTTP server setup for integration tests

use dobby_forge::{CompletionClient, CompletionClientBuilder};
use mockito::{Matcher, Mock, Server, ServerGuard};

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_SYSTEM_PROMPT: &str = "You are a test.";
pub const COMPLETIONS_PATH: &str = "/chat/completions";

/// One SSE `data:` frame carrying a content delta.
pub fn delta(content: &str) -> String {
    serde_json::json!({"choices": [{"delta": {"content": content}, "index": 0}]}).to_string()
}

/// The terminal frame of an OpenAI-style stream.
pub fn finish(reason: &str) -> String {
    serde_json::json!({"choices": [{"delta": {}, "index": 0, "finish_reason": reason}]}).to_string()
}

/// Build an SSE body; frames already starting with `data: ` are kept as is.
pub fn sse_body<S: AsRef<str>>(frames: &[S]) -> String {
    frames
        .iter()
        .map(|frame| {
            let frame = frame.as_ref();
            if frame.starts_with("data: ") {
                format!("{}\n\n", frame)
            } else {
                format!("data: {}\n\n", frame)
            }
        })
        .collect()
}

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn client(&self) -> CompletionClient {
        self.client_for_model("dobby-test")
    }

    pub fn client_for_model(&self, model: &str) -> CompletionClient {
        CompletionClientBuilder::new()
            .api_key(TEST_API_KEY)
            .base_url(&self.base_url)
            .model(model)
            .system_prompt(TEST_SYSTEM_PROMPT)
            .build()
            .expect("test client builds")
    }

    /// A successful SSE response for any completions request.
    pub async fn mock_sse_stream<S: AsRef<str>>(&mut self, frames: &[S]) -> Mock {
        self.mock_sse_stream_matching(Matcher::Any, frames).await
    }

    /// A successful SSE response for requests whose body matches `body`.
    pub async fn mock_sse_stream_matching<S: AsRef<str>>(
        &mut self,
        body: Matcher,
        frames: &[S],
    ) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .match_body(body)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(frames))
            .create_async()
            .await
    }

    /// Create a mock for an error response
    pub async fn mock_error_response(&mut self, status: usize, error_body: &str) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body)
            .create_async()
            .await
    }
}
