//! Shared data model for the quill message-attribute engine.
//!
//! Types here are plain data: ids, message snapshots, the attribute union,
//! secret-chat negotiation state and the HTTP request/response shapes.

pub mod actions;
pub mod api;
pub mod attributes;
pub mod ids;
pub mod models;
pub mod secret_chat;

pub use actions::{PendingActionKind, PendingMessageAction};
pub use attributes::{AttributeKind, AttributeSet, MessageAttribute};
pub use ids::{MessageId, PeerId, PeerNamespace};
pub use models::{Media, Message, StoreMessage, TextWithEntities};
