use crate::client::CompletionBackend;
use crate::prompt::{compose, render_template, DirectiveRecord, PromptRequest};
use crate::relay::channel::{OutputChannel, TextStream};
use crate::relay::profile::{DirectiveSource, PersonaProfile, PromptShape};
use crate::resolver::DirectiveResolver;
use crate::{Error, Result};
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Label of the block sent when a request fails before streaming.
pub const ERROR_LABEL: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Resolving,
    Composing,
    Streaming,
    Completed,
    Failed,
}

impl RelayState {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayState::Resolving => "resolving",
            RelayState::Composing => "composing",
            RelayState::Streaming => "streaming",
            RelayState::Completed => "completed",
            RelayState::Failed => "failed",
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub request_id: String,
    /// `Completed` or `Failed`.
    pub state: RelayState,
    /// Backend chunks delivered to the channel; the placeholder is not counted.
    pub chunks_forwarded: usize,
    /// The channel went away before the stream drained.
    pub abandoned: bool,
}

/// Caller identifiers, used for log correlation only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub query_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, query_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            query_id: query_id.into(),
        }
    }
}

/// Runs one persona profile end to end: resolve, compose, stream, terminate.
pub struct ResponseRelay {
    backend: Arc<dyn CompletionBackend>,
    profile: PersonaProfile,
    resolver: DirectiveResolver,
}

impl ResponseRelay {
    pub fn new(backend: Arc<dyn CompletionBackend>, profile: PersonaProfile) -> Self {
        let resolver = DirectiveResolver::new(Arc::clone(&backend), profile.preamble.clone());
        Self {
            backend,
            profile,
            resolver,
        }
    }

    pub fn profile(&self) -> &PersonaProfile {
        &self.profile
    }

    /// Entry point for a hosting layer. Delegates to [`handle`](Self::handle)
    /// inside a span carrying the session ids.
    pub async fn assist(
        &self,
        session: &SessionContext,
        raw_query: &str,
        channel: &dyn OutputChannel,
    ) -> Result<RelayOutcome> {
        let span = info_span!(
            "assist",
            profile = %self.profile.name,
            session_id = %session.session_id,
            query_id = %session.query_id
        );
        self.handle(raw_query, channel).instrument(span).await
    }

    /// Handle one request.
    ///
    /// Backend failures are contained: the caller sees the chunks that
    /// arrived plus one placeholder, and `Ok` with state `Failed`. Only
    /// `InvalidDirective`/`InvalidTask` return `Err`, after an `ERROR` block.
    /// The channel's `complete()` is called exactly once either way.
    pub async fn handle(
        &self,
        raw_input: &str,
        channel: &dyn OutputChannel,
    ) -> Result<RelayOutcome> {
        let request_id = uuid::Uuid::new_v4().to_string();
        info!(request_id = %request_id, profile = %self.profile.name, "handling request");

        if let Some(block) = &self.profile.status_block {
            if let Err(e) = channel.emit_labeled_block(&block.label, &block.text).await {
                warn!(
                    request_id = %request_id,
                    error = %e,
                    "channel rejected status block, abandoning"
                );
                finish(channel, &request_id).await;
                return Ok(RelayOutcome {
                    request_id,
                    state: RelayState::Completed,
                    chunks_forwarded: 0,
                    abandoned: true,
                });
            }
        }

        let request = match self.prepare(raw_input, &request_id).await {
            Ok(request) => request,
            Err(e) => {
                let message = e.to_string();
                if let Err(block_err) = channel.emit_labeled_block(ERROR_LABEL, &message).await {
                    debug!(
                        request_id = %request_id,
                        error = %block_err,
                        "error block not delivered"
                    );
                }
                finish(channel, &request_id).await;
                return Err(e);
            }
        };

        transition(&request_id, RelayState::Composing, RelayState::Streaming);
        let outcome = self.stream(request, channel, request_id).await;
        finish(channel, &outcome.request_id).await;

        transition(&outcome.request_id, RelayState::Streaming, outcome.state);
        info!(
            request_id = %outcome.request_id,
            state = %outcome.state,
            chunks = outcome.chunks_forwarded,
            abandoned = outcome.abandoned,
            "request finished"
        );
        Ok(outcome)
    }

    /// Resolving and Composing.
    async fn prepare(&self, raw_input: &str, request_id: &str) -> Result<PromptRequest> {
        debug!(request_id, state = %RelayState::Resolving, "relay state");
        let query = raw_input.trim();
        let record = self.resolve(query).await.map_err(|e| {
            log_hard_failure(request_id, &e);
            e
        })?;

        transition(request_id, RelayState::Resolving, RelayState::Composing);
        let request = match &self.profile.prompt {
            PromptShape::Directive => compose(&self.profile.preamble, &record),
            PromptShape::Template { template } => Ok(PromptRequest::new(
                render_template(template, &record, query),
                &record,
            )),
        };
        request.map_err(|e| {
            log_hard_failure(request_id, &e);
            e
        })
    }

    async fn resolve(&self, query: &str) -> Result<DirectiveRecord> {
        match &self.profile.directives {
            DirectiveSource::FromInput => self.resolver.resolve(query).await,
            DirectiveSource::Fixed(fixed) => {
                let content = Some(query.to_string()).filter(|q| !q.is_empty());
                fixed.record(content)
            }
        }
    }

    async fn stream(
        &self,
        request: PromptRequest,
        channel: &dyn OutputChannel,
        request_id: String,
    ) -> RelayOutcome {
        let mut outcome = RelayOutcome {
            request_id,
            state: RelayState::Completed,
            chunks_forwarded: 0,
            abandoned: false,
        };

        let mut output = match channel.open_stream(&self.profile.response_label).await {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    request_id = %outcome.request_id,
                    error = %e,
                    "channel refused stream, abandoning"
                );
                outcome.abandoned = true;
                return outcome;
            }
        };

        let failure = match self
            .backend
            .stream_completion(&request.prompt, request.params())
            .await
        {
            Err(e) => Some(e),
            Ok(mut chunks) => {
                let mut failure = None;
                while let Some(item) = chunks.next().await {
                    match item {
                        Ok(text) => match output.emit_chunk(&text).await {
                            Ok(()) => outcome.chunks_forwarded += 1,
                            Err(e) => {
                                warn!(
                                    request_id = %outcome.request_id,
                                    error = %e,
                                    "channel closed, stop pulling"
                                );
                                outcome.abandoned = true;
                                break;
                            }
                        },
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                failure
            }
        };

        if let Some(e) = failure {
            error!(
                request_id = %outcome.request_id,
                error = %e,
                chunks = outcome.chunks_forwarded,
                "{}",
                failure_message(&e)
            );
            outcome.state = RelayState::Failed;
            let placeholder = &self.profile.error_placeholder;
            emit_placeholder(output.as_mut(), placeholder, &outcome.request_id).await;
        }

        if let Err(e) = output.close().await {
            debug!(request_id = %outcome.request_id, error = %e, "stream close ignored");
        }
        outcome
    }
}

/// Backend faults are expected; anything else reaching the stream is a defect.
fn failure_message(e: &Error) -> &'static str {
    if e.is_backend_fault() {
        "error generating response"
    } else {
        "unexpected error in completion stream; this is a defect"
    }
}

async fn emit_placeholder(output: &mut dyn TextStream, placeholder: &str, request_id: &str) {
    if let Err(e) = output.emit_chunk(placeholder).await {
        debug!(request_id, error = %e, "placeholder not delivered");
    }
}

async fn finish(channel: &dyn OutputChannel, request_id: &str) {
    if let Err(e) = channel.complete().await {
        debug!(request_id, error = %e, "channel complete ignored");
    }
}

fn transition(request_id: &str, from: RelayState, to: RelayState) {
    debug!(request_id, from = %from, to = %to, "relay state");
}

fn log_hard_failure(request_id: &str, e: &Error) {
    match e {
        Error::InvalidTask(task) => {
            error!(request_id, task = %task, "no instruction template for task; this is a defect")
        }
        other => warn!(request_id, error = %other, "request rejected"),
    }
}
