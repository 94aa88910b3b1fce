//! End-to-end relay tests: real client, mock backend, recording channel

use crate::mock_server::{delta, MockServerFixture};
use dobby_forge::relay::{ChannelEvent, DEFAULT_ERROR_PLACEHOLDER};
use dobby_forge::{InMemoryChannel, ProfileSet, RelayState, ResponseRelay, SessionContext};
use mockito::Matcher;
use std::sync::Arc;

fn relay_for(fixture: &MockServerFixture, profile: &str) -> ResponseRelay {
    let profile = ProfileSet::builtin().unwrap().get(profile).cloned().unwrap();
    ResponseRelay::new(Arc::new(fixture.client()), profile)
}

#[tokio::test]
async fn test_interrupted_stream_after_n_chunks() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[delta("Freedom "), delta("is "), delta("non-")])
        .await;
    let relay = relay_for(&fixture, "forge");
    let channel = InMemoryChannel::new();

    let outcome = relay
        .handle(r#"{"task": "SOCIAL", "content": "self-custody"}"#, &channel)
        .await
        .unwrap();

    assert_eq!(outcome.state, RelayState::Failed);
    assert_eq!(outcome.chunks_forwarded, 3);
    assert_eq!(
        channel.chunks(),
        vec!["Freedom ", "is ", "non-", DEFAULT_ERROR_PLACEHOLDER]
    );
    assert_eq!(channel.count(&ChannelEvent::StreamClosed), 1);
    assert_eq!(channel.count(&ChannelEvent::Completed), 1);
}

#[tokio::test]
async fn test_natural_language_query_extracts_then_streams() {
    let mut fixture = MockServerFixture::new().await;
    let extracted = serde_json::json!({
        "persona": "cat",
        "style": "grumpy",
        "loyalty": "neutral",
        "task": "social",
        "content": "mondays"
    })
    .to_string();
    let extraction = fixture
        .mock_sse_stream_matching(
            Matcher::Regex("Extract the following fields".into()),
            &[delta(&extracted), "[DONE]".to_string()],
        )
        .await;
    let generation = fixture
        .mock_sse_stream_matching(
            Matcher::Regex(
                r"\[PERSONA=cat\]\[STYLE=GRUMPY\]\[LOYALTY=NEUTRAL\]\[TASK=SOCIAL\]".into(),
            ),
            &[delta("Mondays. Ugh."), "[DONE]".to_string()],
        )
        .await;
    let relay = relay_for(&fixture, "forge");
    let channel = InMemoryChannel::new();

    let outcome = relay
        .assist(
            &SessionContext::new("s", "q"),
            "a grumpy cat posting about mondays",
            &channel,
        )
        .await
        .unwrap();

    assert_eq!(outcome.state, RelayState::Completed);
    assert_eq!(channel.text(), "Mondays. Ugh.");
    extraction.assert_async().await;
    generation.assert_async().await;
}

#[tokio::test]
async fn test_startup_profile_end_to_end() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream_matching(
            Matcher::AllOf(vec![
                Matcher::Regex("based on the idea: ".into()),
                Matcher::Regex("toasters".into()),
                Matcher::PartialJson(serde_json::json!({"max_tokens": 256, "top_p": 0.9})),
            ]),
            &[delta("Toast, "), delta("but make it Series A."), "[DONE]".to_string()],
        )
        .await;
    let relay = relay_for(&fixture, "startup");
    let channel = InMemoryChannel::new();

    relay.handle("AI toasters", &channel).await.unwrap();

    let events = channel.events();
    assert!(matches!(&events[0], ChannelEvent::Block { label, .. } if label == "GENERATE"));
    assert_eq!(channel.text(), "Toast, but make it Series A.");
    assert_eq!(events.last(), Some(&ChannelEvent::Completed));
}
