//! Streaming decoder (Bytes -> SSE frames)
//!
//! Frames are split on a blank line, `data:` lines are joined, and the
//! `[DONE]` marker is surfaced as its own frame so the caller can tell a
//! clean end from a truncated body.

use crate::BoxStream;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::debug;

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// A JSON payload carried by the event's `data:` lines.
    Data(Value),
    /// The done marker (`data: [DONE]` by default).
    Done,
}

/// A minimal SSE decoder:
/// - splits by a blank line (`\n\n`, carriage returns are dropped)
/// - joins `data:` lines and ignores `event:`/`id:`/comment lines
/// - reports [`DONE_SIGNAL`] as [`SseFrame::Done`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SseDecoder;

/// Payload that ends an OpenAI-compatible stream.
pub const DONE_SIGNAL: &str = "[DONE]";

impl SseDecoder {
    /// Parse one raw frame. Returns `None` for frames that carry no usable payload.
    pub fn parse_frame(&self, raw: &str) -> Option<SseFrame> {
        let mut data_lines = Vec::new();
        for line in raw.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("data:") {
                data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
            }
        }
        if data_lines.is_empty() {
            return None;
        }

        let payload = data_lines.join("\n");
        let payload = payload.trim();
        if payload == DONE_SIGNAL {
            return Some(SseFrame::Done);
        }
        match serde_json::from_str(payload) {
            Ok(v) => Some(SseFrame::Data(v)),
            Err(e) => {
                // Skip non-json frames; keep streaming.
                debug!(error = %e, "skipping non-JSON SSE frame");
                None
            }
        }
    }

    /// Decode a byte stream into SSE frames.
    ///
    /// Bytes are buffered until a full frame is available, so multi-byte UTF-8
    /// sequences split across network chunks are reassembled before decoding.
    /// Transport errors are forwarded unchanged.
    pub fn decode_stream(
        self,
        input: BoxStream<'static, Bytes>,
    ) -> BoxStream<'static, SseFrame> {
        let stream = stream::unfold(
            (self, input, Vec::<u8>::new(), false),
            |(decoder, mut input, mut buf, eof)| async move {
                loop {
                    // If we have a full frame in buffer, emit it.
                    if let Some(idx) = find_delimiter(&buf) {
                        let frame: Vec<u8> = buf.drain(..idx + 2).collect();
                        let text = String::from_utf8_lossy(&frame[..idx]).into_owned();
                        if let Some(parsed) = decoder.parse_frame(&text) {
                            return Some((Ok(parsed), (decoder, input, buf, eof)));
                        }
                        continue;
                    }

                    if eof {
                        return None;
                    }

                    // Need more data.
                    match input.next().await {
                        Some(Ok(bytes)) => {
                            buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                        }
                        Some(Err(e)) => {
                            return Some((Err(e), (decoder, input, buf, true)));
                        }
                        None => {
                            // EOF: try parse remaining buffer once
                            let rest = String::from_utf8_lossy(&buf).into_owned();
                            buf.clear();
                            if let Some(parsed) = decoder.parse_frame(&rest) {
                                return Some((Ok(parsed), (decoder, input, buf, true)));
                            }
                            return None;
                        }
                    }
                }
            },
        );

        Box::pin(stream)
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}
