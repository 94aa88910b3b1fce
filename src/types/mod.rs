//! Wire types shared by the client and the streaming pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role and text content |
//! | [`MessageRole`] | Message role (system, user, assistant) |
//!
//! ## Example
//!
//! ```rust
//! use dobby_forge::types::{Message, MessageRole};
//!
//! let system = Message::system("You are a helpful assistant");
//! let user = Message::user("Roast my startup idea");
//! assert_eq!(system.role, MessageRole::System);
//! assert_eq!(user.content, "Roast my startup idea");
//! ```

pub mod message;

pub use message::{Message, MessageRole};
