use serde::{Deserialize, Serialize};

/// Kinds of deferred remote acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PendingActionKind {
    ConsumeUnseenPersonalMessage,
    ReadReaction,
}

impl PendingActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConsumeUnseenPersonalMessage => "consume_unseen_personal_message",
            Self::ReadReaction => "read_reaction",
        }
    }
}

/// Payload stored with a pending action marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMessageAction {
    pub recorded_at: i32,
}
