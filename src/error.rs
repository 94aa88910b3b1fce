use thiserror::Error;

/// Structured error context for configuration and startup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key or field that caused the error (e.g., "MODEL_API_KEY", "base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected format, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "app_config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the forge pipeline.
///
/// Only `Configuration` (at startup) and the two request-level defects,
/// `InvalidDirective` and `InvalidTask`, are meant to reach a caller. The
/// backend faults are contained by the relay.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid directive `{field}`: cannot coerce {value}")]
    InvalidDirective { field: String, value: String },

    #[error("Invalid task `{0}`: no instruction template registered")]
    InvalidTask(String),

    #[error("Backend unavailable{}: {message}", format_status(.status))]
    BackendUnavailable {
        message: String,
        status: Option<u16>,
    },

    #[error("Stream interrupted after {chunks_received} chunk(s): {message}")]
    StreamInterrupted {
        message: String,
        chunks_received: usize,
    },

    #[error("Output channel closed")]
    ChannelClosed,

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Profile file error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_directive(field: impl Into<String>, value: &serde_json::Value) -> Self {
        Error::InvalidDirective {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn backend_unavailable(msg: impl Into<String>, status: Option<u16>) -> Self {
        Error::BackendUnavailable {
            message: msg.into(),
            status,
        }
    }

    pub fn stream_interrupted(msg: impl Into<String>, chunks_received: usize) -> Self {
        Error::StreamInterrupted {
            message: msg.into(),
            chunks_received,
        }
    }

    /// Transient backend faults that the relay replaces with a placeholder chunk.
    pub fn is_backend_fault(&self) -> bool {
        matches!(
            self,
            Error::BackendUnavailable { .. } | Error::StreamInterrupted { .. }
        )
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
