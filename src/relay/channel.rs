//! Output channels: where the relay sends status blocks and response chunks.

use crate::{Error, Result};
use async_trait::async_trait;
use std::io;
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// An open response stream on a channel.
#[async_trait]
pub trait TextStream: Send {
    /// Forward one chunk. `Error::ChannelClosed` means the receiver is gone.
    async fn emit_chunk(&mut self, text: &str) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// The hosting layer's side of a request.
#[async_trait]
pub trait OutputChannel: Send + Sync {
    /// A discrete labeled message, such as a status announcement.
    async fn emit_labeled_block(&self, label: &str, text: &str) -> Result<()>;

    async fn open_stream(&self, label: &str) -> Result<Box<dyn TextStream>>;

    /// Signals that nothing more will be sent for this request.
    async fn complete(&self) -> Result<()>;
}

fn channel_error(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::BrokenPipe {
        Error::ChannelClosed
    } else {
        Error::Io(e)
    }
}

async fn write_flushed<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await.map_err(channel_error)?;
    out.flush().await.map_err(channel_error)
}

/// Terminal channel: response text on stdout, labels and blocks on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    pub fn new() -> Self {
        Self
    }
}

struct ConsoleStream {
    stdout: tokio::io::Stdout,
    wrote_any: bool,
}

#[async_trait]
impl TextStream for ConsoleStream {
    async fn emit_chunk(&mut self, text: &str) -> Result<()> {
        write_flushed(&mut self.stdout, text).await?;
        self.wrote_any |= !text.is_empty();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.wrote_any {
            write_flushed(&mut self.stdout, "\n").await?;
        }
        Ok(())
    }
}

#[async_trait]
impl OutputChannel for ConsoleChannel {
    async fn emit_labeled_block(&self, label: &str, text: &str) -> Result<()> {
        write_flushed(&mut tokio::io::stderr(), &format!("[{label}] {text}\n")).await
    }

    async fn open_stream(&self, label: &str) -> Result<Box<dyn TextStream>> {
        write_flushed(&mut tokio::io::stderr(), &format!("[{label}]\n")).await?;
        Ok(Box::new(ConsoleStream {
            stdout: tokio::io::stdout(),
            wrote_any: false,
        }))
    }

    async fn complete(&self) -> Result<()> {
        tokio::io::stdout().flush().await.map_err(channel_error)
    }
}

/// What an [`InMemoryChannel`] saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Block { label: String, text: String },
    StreamOpened { label: String },
    Chunk(String),
    StreamClosed,
    Completed,
}

type EventLog = Arc<RwLock<Vec<ChannelEvent>>>;

fn record(events: &EventLog, event: ChannelEvent) {
    events
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(event);
}

/// Recording channel. Clones share one event log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChannel {
    events: EventLog,
    close_after: Option<usize>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` chunks per stream, then report `ChannelClosed`.
    pub fn close_after(n: usize) -> Self {
        Self {
            events: EventLog::default(),
            close_after: Some(n),
        }
    }

    pub fn events(&self) -> Vec<ChannelEvent> {
        self.events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Accepted chunk texts, in order.
    pub fn chunks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ChannelEvent::Chunk(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Accepted chunks concatenated.
    pub fn text(&self) -> String {
        self.chunks().concat()
    }

    pub fn count(&self, wanted: &ChannelEvent) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }
}

struct InMemoryStream {
    events: EventLog,
    remaining: Option<usize>,
}

#[async_trait]
impl TextStream for InMemoryStream {
    async fn emit_chunk(&mut self, text: &str) -> Result<()> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(Error::ChannelClosed);
            }
            *remaining -= 1;
        }
        record(&self.events, ChannelEvent::Chunk(text.to_string()));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        record(&self.events, ChannelEvent::StreamClosed);
        Ok(())
    }
}

#[async_trait]
impl OutputChannel for InMemoryChannel {
    async fn emit_labeled_block(&self, label: &str, text: &str) -> Result<()> {
        record(
            &self.events,
            ChannelEvent::Block {
                label: label.to_string(),
                text: text.to_string(),
            },
        );
        Ok(())
    }

    async fn open_stream(&self, label: &str) -> Result<Box<dyn TextStream>> {
        record(
            &self.events,
            ChannelEvent::StreamOpened {
                label: label.to_string(),
            },
        );
        Ok(Box::new(InMemoryStream {
            events: Arc::clone(&self.events),
            remaining: self.close_after,
        }))
    }

    async fn complete(&self) -> Result<()> {
        record(&self.events, ChannelEvent::Completed);
        Ok(())
    }
}
