use serde::{Deserialize, Serialize};

use crate::ids::PeerId;
use crate::models::{MessageTextEntity, TextWithEntities};

/// Timeout sentinel meaning "destroy right after the first view".
pub const VIEW_ONCE_TIMEOUT: i32 = 0x7fff_ffff;

/// Timers at or below this many seconds mark media as self-destructing.
pub const SECRET_MEDIA_MAX_TIMEOUT: i32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub value: String,
    pub count: i32,
    pub chosen_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentReactionPeer {
    pub value: String,
    pub peer_id: PeerId,
    pub is_unseen: bool,
    pub is_large: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionsAttribute {
    pub reactions: Vec<ReactionCount>,
    pub recent_peers: Vec<RecentReactionPeer>,
}

impl ReactionsAttribute {
    pub fn has_unseen(&self) -> bool {
        self.recent_peers.iter().any(|peer| peer.is_unseen)
    }

    pub fn with_all_seen(&self) -> Self {
        let mut updated = self.clone();
        for peer in &mut updated.recent_peers {
            peer.is_unseen = false;
        }
        updated
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationAttribute {
    pub text: String,
    pub entities: Vec<MessageTextEntity>,
    pub to_lang: String,
    /// Extra translated parts, e.g. poll options in display order.
    #[serde(default)]
    pub additional: Vec<TextWithEntities>,
    pub poll_solution: Option<TextWithEntities>,
}

/// Typed metadata attached to a message. A message carries at most one
/// attribute of each [`AttributeKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageAttribute {
    ConsumableContent {
        consumed: bool,
    },
    ConsumablePersonalMention {
        consumed: bool,
        pending: bool,
    },
    AutoremoveTimeout {
        timeout: i32,
        countdown_begin_time: Option<i32>,
    },
    AutoclearTimeout {
        timeout: i32,
        countdown_begin_time: Option<i32>,
    },
    Reactions(ReactionsAttribute),
    AudioTranscription {
        id: i64,
        text: String,
        is_pending: bool,
        did_rate: bool,
    },
    Translation(TranslationAttribute),
    TextEntities {
        entities: Vec<MessageTextEntity>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    ConsumableContent,
    ConsumablePersonalMention,
    AutoremoveTimeout,
    AutoclearTimeout,
    Reactions,
    AudioTranscription,
    Translation,
    TextEntities,
}

impl MessageAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::ConsumableContent { .. } => AttributeKind::ConsumableContent,
            Self::ConsumablePersonalMention { .. } => AttributeKind::ConsumablePersonalMention,
            Self::AutoremoveTimeout { .. } => AttributeKind::AutoremoveTimeout,
            Self::AutoclearTimeout { .. } => AttributeKind::AutoclearTimeout,
            Self::Reactions(_) => AttributeKind::Reactions,
            Self::AudioTranscription { .. } => AttributeKind::AudioTranscription,
            Self::Translation(_) => AttributeKind::Translation,
            Self::TextEntities { .. } => AttributeKind::TextEntities,
        }
    }
}

/// Ordered attribute list keyed by variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(Vec<MessageAttribute>);

impl AttributeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageAttribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&MessageAttribute> {
        self.0.iter().find(|attribute| attribute.kind() == kind)
    }

    /// Drops any attribute of the same variant, then appends `attribute`.
    pub fn replace(&mut self, attribute: MessageAttribute) {
        let kind = attribute.kind();
        self.0.retain(|existing| existing.kind() != kind);
        self.0.push(attribute);
    }

    pub fn into_vec(self) -> Vec<MessageAttribute> {
        self.0
    }
}

/// Builds a set, keeping only the last attribute of each variant.
impl From<Vec<MessageAttribute>> for AttributeSet {
    fn from(attributes: Vec<MessageAttribute>) -> Self {
        let mut set = Self::new();
        for attribute in attributes {
            set.replace(attribute);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a MessageAttribute;
    type IntoIter = std::slice::Iter<'a, MessageAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
