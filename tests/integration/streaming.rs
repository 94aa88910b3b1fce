//! Integration tests for streaming responses

use crate::mock_server::{delta, finish, MockServerFixture, TEST_API_KEY, TEST_SYSTEM_PROMPT};
use dobby_forge::{CompletionBackend, GenerationParams};
use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;

async fn collect(client: &impl CompletionBackend, prompt: &str) -> Vec<String> {
    let mut stream = client
        .stream_completion(prompt, GenerationParams::default())
        .await
        .unwrap();
    let mut chunks = Vec::new();
    while let Some(chunk) = stream.next().await {
        chunks.push(chunk.unwrap());
    }
    chunks
}

#[tokio::test]
async fn test_sse_streaming_response() {
    let mut fixture = MockServerFixture::new().await;
    let role_only = json!({"choices": [{"delta": {"role": "assistant"}, "index": 0}]}).to_string();
    let mock = fixture
        .mock_sse_stream(&[role_only, delta("Hello"), delta(" World"), "[DONE]".to_string()])
        .await;

    let chunks = collect(&fixture.client(), "hi").await;

    assert_eq!(chunks, vec!["Hello", " World"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_finish_reason_without_done_is_a_clean_end() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[delta("short"), finish("stop")])
        .await;

    assert_eq!(collect(&fixture.client(), "hi").await, vec!["short"]);
}

#[tokio::test]
async fn test_complete_equals_concatenated_stream() {
    let mut fixture = MockServerFixture::new().await;
    let frames = [delta("a"), delta("b"), delta("c"), "[DONE]".to_string()];
    let _mock = fixture.mock_sse_stream(&frames).await;
    let client = fixture.client();

    let streamed = collect(&client, "abc").await.concat();
    let completed = client.complete("abc").await;

    assert_eq!(streamed, "abc");
    assert_eq!(completed, streamed);
}

#[tokio::test]
async fn test_request_shape() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/chat/completions")
        .match_header("authorization", format!("Bearer {}", TEST_API_KEY).as_str())
        .match_header("accept", "text/event-stream")
        .match_header("x-request-id", Matcher::Regex("^[0-9a-f-]{36}$".into()))
        .match_body(Matcher::PartialJson(json!({
            "model": "dobby-test",
            "stream": true,
            "temperature": 0.3,
            "top_p": 1.0,
            "max_tokens": 42,
            "messages": [
                {"role": "system", "content": TEST_SYSTEM_PROMPT},
                {"role": "user", "content": "roast my idea"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: [DONE]\n\n")
        .create_async()
        .await;

    let client = fixture.client();
    let mut stream = client
        .stream_completion(
            "roast my idea",
            GenerationParams::new().temperature(0.3).max_tokens(42),
        )
        .await
        .unwrap();
    assert!(stream.next().await.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_merged_user_framing_for_models_without_system_role() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream_matching(
            Matcher::PartialJson(json!({
                "model": "o1-mini",
                "messages": [{
                    "role": "user",
                    "content": format!(
                        "System Instruction: {}\n Instruction: hi",
                        TEST_SYSTEM_PROMPT
                    )
                }]
            })),
            &[delta("ok"), "[DONE]".to_string()],
        )
        .await;

    let chunks = collect(&fixture.client_for_model("o1-mini"), "hi").await;

    assert_eq!(chunks, vec!["ok"]);
    mock.assert_async().await;
}
