//! Integration tests for error handling

use crate::mock_server::{delta, MockServerFixture};
use dobby_forge::{CompletionBackend, CompletionClientBuilder, Error, GenerationParams};
use dobby_forge::COMPLETION_FAILED_SENTINEL;
use futures::StreamExt;

#[tokio::test]
async fn test_error_status_is_backend_unavailable() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(503, r#"{"error":{"message":"model is overloaded"}}"#)
        .await;

    let err = match fixture
        .client()
        .stream_completion("hi", GenerationParams::default())
        .await
    {
        Ok(_) => panic!("expected the call to fail"),
        Err(e) => e,
    };

    match err {
        Error::BackendUnavailable { message, status } => {
            assert_eq!(status, Some(503));
            assert_eq!(message, "model is overloaded");
        }
        other => panic!("expected BackendUnavailable, got {other}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_backend_unavailable() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_error_response(401, "nope").await;

    let err = fixture.client().try_complete("hi").await.unwrap_err();
    assert!(matches!(
        err,
        Error::BackendUnavailable {
            status: Some(401),
            ..
        }
    ));
    assert!(err.is_backend_fault());
}

#[tokio::test]
async fn test_connection_refused() {
    let client = CompletionClientBuilder::new()
        .api_key("k")
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = client.try_complete("hi").await.unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { status: None, .. }));
    assert_eq!(client.complete("hi").await, COMPLETION_FAILED_SENTINEL);
}

#[tokio::test]
async fn test_error_frame_interrupts_stream_once() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[
            delta("partial"),
            r#"{"error":{"message":"upstream reset"}}"#.to_string(),
            delta("never seen"),
        ])
        .await;

    let mut stream = fixture
        .client()
        .stream_completion("hi", GenerationParams::default())
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
    match stream.next().await.unwrap() {
        Err(Error::StreamInterrupted {
            chunks_received, ..
        }) => assert_eq!(chunks_received, 1),
        other => panic!("expected StreamInterrupted, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_truncated_stream_is_interrupted() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_sse_stream(&[delta("a"), delta("b")]).await;
    let client = fixture.client();

    let err = client.try_complete("hi").await.unwrap_err();
    assert!(matches!(
        err,
        Error::StreamInterrupted {
            chunks_received: 2,
            ..
        }
    ));
    assert_eq!(client.complete("hi").await, COMPLETION_FAILED_SENTINEL);
}
