//! HTTP transport for the chat-completion backend.

mod http;

pub use http::{HttpTransport, TransportError};
