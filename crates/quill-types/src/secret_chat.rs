use serde::{Deserialize, Serialize};

/// Protocol dialects an encrypted operation can be encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecretChatLayer {
    Layer8,
    Layer46,
    Layer73,
    Layer101,
    Layer143,
    Layer144,
}

impl SecretChatLayer {
    pub fn number(self) -> i32 {
        match self {
            Self::Layer8 => 8,
            Self::Layer46 => 46,
            Self::Layer73 => 73,
            Self::Layer101 => 101,
            Self::Layer143 => 143,
            Self::Layer144 => 144,
        }
    }
}

/// Layer used by chats still on the pre-sequence protocol.
pub const BASIC_LAYER: SecretChatLayer = SecretChatLayer::Layer8;

/// Highest layer this client can speak, advertised via layer-support reports.
pub const CURRENT_LAYER: i32 = 144;

/// Layers a sequence-based chat can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SequenceBasedLayer {
    Layer46,
    Layer73,
    Layer101,
    Layer143,
    Layer144,
}

impl SequenceBasedLayer {
    pub fn secret_chat_layer(self) -> SecretChatLayer {
        match self {
            Self::Layer46 => SecretChatLayer::Layer46,
            Self::Layer73 => SecretChatLayer::Layer73,
            Self::Layer101 => SecretChatLayer::Layer101,
            Self::Layer143 => SecretChatLayer::Layer143,
            Self::Layer144 => SecretChatLayer::Layer144,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceBasedState {
    pub active_layer: SequenceBasedLayer,
    /// Whether our own supported layer has been announced to the peer.
    #[serde(default)]
    pub layer_support_reported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum SecretChatEmbeddedState {
    Terminated,
    Handshake,
    BasicLayer,
    SequenceBased(SequenceBasedState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretChatRole {
    Creator,
    Participant,
}

/// Per-chat negotiation state owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretChatState {
    pub role: SecretChatRole,
    pub embedded_state: SecretChatEmbeddedState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum OutgoingSecretOperation {
    ReadMessagesContent {
        layer: SecretChatLayer,
        action_globally_unique_id: i64,
        globally_unique_ids: Vec<i64>,
    },
    ReportLayerSupport {
        layer: SecretChatLayer,
        action_globally_unique_id: i64,
        layer_support: i32,
    },
}
