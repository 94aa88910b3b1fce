//! Integration tests against a mock OpenAI-compatible server

mod error_handling;
mod mock_server;
mod relay;
mod streaming;
