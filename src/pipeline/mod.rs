//! 流水线处理模块：把后端的 SSE 字节流转换为有序的文本片段。
//!
//! # Streaming Pipeline
//!
//! Turns the raw body of a streaming chat completion into the ordered text
//! chunks the relay forwards.
//!
//! ```text
//! Raw Bytes → SseDecoder → SseFrame → delta selection → text chunks
//!     │            │            │              │
//!   HTTP       framing,     Data/Done    choices.0.delta.content,
//!              [DONE]                    finish_reason, error frames
//! ```
//!
//! The chunk stream ends cleanly on `[DONE]` or after a frame that carries a
//! `finish_reason`. Anything else that stops the stream (a transport error, a
//! provider error frame, a body that simply ends) is reported once as
//! [`Error::StreamInterrupted`](crate::Error::StreamInterrupted), after which
//! the stream is exhausted.

pub mod decode;

use crate::client::StreamSession;
use crate::{BoxStream, Error};
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

pub use decode::{SseDecoder, SseFrame};

/// What one data frame contributes to the text stream.
#[derive(Debug, Default, PartialEq)]
pub struct FrameDelta {
    pub content: Option<String>,
    pub finished: bool,
    pub error: Option<String>,
}

impl FrameDelta {
    /// Select the text delta, finish marker and error envelope of an
    /// OpenAI-compatible `chat.completion.chunk` frame.
    pub fn from_frame(frame: &Value) -> Self {
        if let Some(err) = frame.get("error").filter(|e| !e.is_null()) {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Self {
                error: Some(message),
                ..Self::default()
            };
        }

        let choice = frame.pointer("/choices/0");
        let content = choice
            .and_then(|c| c.pointer("/delta/content"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let finished = choice
            .and_then(|c| c.get("finish_reason"))
            .map(|r| !r.is_null())
            .unwrap_or(false);

        Self {
            content,
            finished,
            error: None,
        }
    }
}

struct ChunkState {
    frames: BoxStream<'static, SseFrame>,
    session: StreamSession,
    emitted: usize,
    finished: bool,
    ended: bool,
}

impl ChunkState {
    fn interrupt(mut self, message: String) -> Option<(crate::Result<String>, Self)> {
        warn!(
            request_id = %self.session.request_id,
            chunks = self.emitted,
            error = %message,
            "completion stream interrupted"
        );
        self.ended = true;
        let err = Error::stream_interrupted(message, self.emitted);
        Some((Err(err), self))
    }
}

/// Build the text-chunk stream for one streaming session.
///
/// The session is owned by the stream and dropped with it.
pub fn text_chunks(
    body: BoxStream<'static, Bytes>,
    session: StreamSession,
) -> BoxStream<'static, String> {
    let state = ChunkState {
        frames: SseDecoder::default().decode_stream(body),
        session,
        emitted: 0,
        finished: false,
        ended: false,
    };

    let stream = stream::unfold(state, |mut state| async move {
        if state.ended {
            return None;
        }
        loop {
            match state.frames.next().await {
                Some(Ok(SseFrame::Done)) => {
                    debug!(
                        request_id = %state.session.request_id,
                        chunks = state.emitted,
                        "completion stream finished"
                    );
                    return None;
                }
                Some(Ok(SseFrame::Data(frame))) => {
                    let delta = FrameDelta::from_frame(&frame);
                    if let Some(message) = delta.error {
                        return state.interrupt(message);
                    }
                    if delta.finished {
                        state.finished = true;
                    }
                    if let Some(text) = delta.content {
                        state.emitted += 1;
                        return Some((Ok(text), state));
                    }
                }
                Some(Err(e)) => return state.interrupt(e.to_string()),
                None if state.finished => return None,
                None => {
                    return state.interrupt(
                        "stream ended before a finish_reason or [DONE] marker".to_string(),
                    )
                }
            }
        }
    });

    Box::pin(stream)
}
