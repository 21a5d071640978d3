use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeSet, MessageAttribute, SECRET_MEDIA_MAX_TIMEOUT, VIEW_ONCE_TIMEOUT};
use crate::ids::{MessageId, PeerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: PeerId,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageTag {
    UnseenPersonalMessage,
    UnseenReaction,
}

// -- Text --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TextEntityKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
    Pre { language: Option<String> },
    Url,
    TextUrl { url: String },
    Mention,
    MentionName { peer_id: PeerId },
    Hashtag,
    CustomEmoji { file_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTextEntity {
    pub offset: i32,
    pub length: i32,
    pub kind: TextEntityKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextWithEntities {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<MessageTextEntity>,
}

impl TextWithEntities {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entities: Vec::new(),
        }
    }
}

// -- Media --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FileKind {
    Voice { duration: i32 },
    InstantVideo { duration: i32 },
    Video { duration: i32 },
    Audio { duration: i32 },
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMedia {
    pub id: i64,
    pub mime_type: String,
    pub size: Option<i64>,
    pub kind: FileKind,
}

impl FileMedia {
    pub fn is_voice(&self) -> bool {
        matches!(self.kind, FileKind::Voice { .. })
    }

    pub fn is_instant_video(&self) -> bool {
        matches!(self.kind, FileKind::InstantVideo { .. })
    }

    pub fn duration(&self) -> Option<i32> {
        match self.kind {
            FileKind::Voice { duration }
            | FileKind::InstantVideo { duration }
            | FileKind::Video { duration }
            | FileKind::Audio { duration } => Some(duration),
            FileKind::Document => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: TextWithEntities,
    pub opaque_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub question: TextWithEntities,
    pub options: Vec<PollOption>,
    /// Quiz explanation shown after answering.
    pub solution: Option<TextWithEntities>,
}

/// Placeholder left behind once self-destructing media has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiredContent {
    Image,
    VideoMessage,
    VoiceMessage,
    File,
}

impl ExpiredContent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "expired:image",
            Self::VideoMessage => "expired:videoMessage",
            Self::VoiceMessage => "expired:voiceMessage",
            Self::File => "expired:file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Media {
    Image { id: i64 },
    File(FileMedia),
    Poll(Poll),
    WebPage { url: String },
    Expired { content: ExpiredContent },
}

impl Media {
    /// Media that a self-destruct timer is allowed to wipe.
    pub fn is_destructible(&self) -> bool {
        matches!(self, Self::Image { .. } | Self::File(_))
    }

    /// The placeholder this media turns into once expired, if it is destructible.
    pub fn expired_placeholder(&self) -> Option<ExpiredContent> {
        match self {
            Self::Image { .. } => Some(ExpiredContent::Image),
            Self::File(file) if file.is_instant_video() => Some(ExpiredContent::VideoMessage),
            Self::File(file) if file.is_voice() => Some(ExpiredContent::VoiceMessage),
            Self::File(_) => Some(ExpiredContent::File),
            _ => None,
        }
    }
}

// -- Forward info --

/// Forward header as read back from storage, with peers resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardInfo {
    pub author: Option<Peer>,
    pub source: Option<Peer>,
    pub source_message_id: Option<MessageId>,
    pub date: i32,
    pub author_signature: Option<String>,
    pub psa_type: Option<String>,
    pub flags: i32,
}

/// Forward header in its persisted form: peer references only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreForwardInfo {
    pub author_id: Option<PeerId>,
    pub source_id: Option<PeerId>,
    pub source_message_id: Option<MessageId>,
    pub date: i32,
    pub author_signature: Option<String>,
    pub psa_type: Option<String>,
    pub flags: i32,
}

impl From<&ForwardInfo> for StoreForwardInfo {
    fn from(info: &ForwardInfo) -> Self {
        Self {
            author_id: info.author.as_ref().map(|p| p.id),
            source_id: info.source.as_ref().map(|p| p.id),
            source_message_id: info.source_message_id,
            date: info.date,
            author_signature: info.author_signature.clone(),
            psa_type: info.psa_type.clone(),
            flags: info.flags,
        }
    }
}

// -- Messages --

/// Snapshot of a stored message. Never edited in place; mutations build a
/// [`StoreMessage`] and replace the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub globally_unique_id: Option<i64>,
    pub timestamp: i32,
    pub incoming: bool,
    pub tags: BTreeSet<MessageTag>,
    pub forward_info: Option<ForwardInfo>,
    pub author_id: Option<PeerId>,
    pub text: String,
    pub attributes: AttributeSet,
    pub media: Vec<Media>,
}

impl Message {
    pub fn is_secret_chat(&self) -> bool {
        self.id.peer_id.is_secret_chat()
    }

    /// True when a short self-destruct timer guards destructible media.
    pub fn contains_secret_media(&self) -> bool {
        let timeout = self.attributes.iter().find_map(|attribute| match attribute {
            MessageAttribute::AutoremoveTimeout { timeout, .. }
            | MessageAttribute::AutoclearTimeout { timeout, .. } => Some(*timeout),
            _ => None,
        });

        match timeout {
            Some(t) if t == VIEW_ONCE_TIMEOUT || t <= SECRET_MEDIA_MAX_TIMEOUT => {
                self.media.iter().any(Media::is_destructible)
            }
            _ => false,
        }
    }

    /// Playback length of the longest timed media item, if any is known.
    pub fn secret_media_duration(&self) -> Option<i32> {
        self.media
            .iter()
            .filter_map(|media| match media {
                Media::File(file) => file.duration(),
                _ => None,
            })
            .max()
    }

    pub fn poll(&self) -> Option<&Poll> {
        self.media.iter().find_map(|media| match media {
            Media::Poll(poll) => Some(poll),
            _ => None,
        })
    }
}

/// The full record written back to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMessage {
    pub id: MessageId,
    pub globally_unique_id: Option<i64>,
    pub timestamp: i32,
    pub incoming: bool,
    pub tags: BTreeSet<MessageTag>,
    pub forward_info: Option<StoreForwardInfo>,
    pub author_id: Option<PeerId>,
    pub text: String,
    pub attributes: AttributeSet,
    pub media: Vec<Media>,
}

impl From<&Message> for StoreMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            globally_unique_id: message.globally_unique_id,
            timestamp: message.timestamp,
            incoming: message.incoming,
            tags: message.tags.clone(),
            forward_info: message.forward_info.as_ref().map(StoreForwardInfo::from),
            author_id: message.author_id,
            text: message.text.clone(),
            attributes: message.attributes.clone(),
            media: message.media.clone(),
        }
    }
}

/// Per-peer data cached alongside the chat list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPeerData {
    #[serde(default)]
    pub translations_hidden: bool,
}
