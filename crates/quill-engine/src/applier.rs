//! The single write path for message attributes, media and tags.
//!
//! Every other component describes its change as a [`MessageDelta`] and hands
//! it to [`apply`] inside the transaction it already holds.

use anyhow::Result;
use tracing::debug;

use quill_db::{Transaction, UpdateMessage};
use quill_types::models::MessageTag;
use quill_types::{Media, Message, MessageAttribute, MessageId, StoreMessage};

/// Attribute replacements plus an optional media swap and tag removals for one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDelta {
    pub attributes: Vec<MessageAttribute>,
    pub media: Option<Vec<Media>>,
    pub remove_tags: Vec<MessageTag>,
}

impl MessageDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `attribute` to replace the message's attribute of the same variant.
    /// A later replacement of the same variant wins.
    pub fn replace(&mut self, attribute: MessageAttribute) {
        let kind = attribute.kind();
        self.attributes.retain(|existing| existing.kind() != kind);
        self.attributes.push(attribute);
    }

    pub fn set_media(&mut self, media: Vec<Media>) {
        self.media = Some(media);
    }

    pub fn remove_tag(&mut self, tag: MessageTag) {
        if !self.remove_tags.contains(&tag) {
            self.remove_tags.push(tag);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.media.is_none()
            && self.remove_tags.is_empty()
    }
}

/// Builds the record `delta` would produce, or `None` when nothing changes.
pub fn rebuild(current: &Message, delta: &MessageDelta) -> Option<StoreMessage> {
    // StoreMessage::from re-derives the id-only forward header from the resolved one.
    let mut updated = StoreMessage::from(current);
    let mut changed = false;

    for attribute in &delta.attributes {
        if updated.attributes.get(attribute.kind()) != Some(attribute) {
            updated.attributes.replace(attribute.clone());
            changed = true;
        }
    }

    if let Some(media) = &delta.media {
        if *media != updated.media {
            updated.media = media.clone();
            changed = true;
        }
    }

    for tag in &delta.remove_tags {
        changed |= updated.tags.remove(tag);
    }

    changed.then_some(updated)
}

/// Applies `delta` to message `id` inside `tx`. Returns whether the record
/// was rewritten; a missing message or a no-change delta returns `false`.
pub fn apply(tx: &Transaction<'_>, id: MessageId, delta: &MessageDelta) -> Result<bool> {
    if delta.is_empty() {
        return Ok(false);
    }

    let written = tx.update_message(id, |current| match rebuild(current, delta) {
        Some(updated) => UpdateMessage::Update(updated),
        None => UpdateMessage::Skip,
    })?;

    if written {
        debug!(
            "Applied delta to {} ({} attributes, media: {}, tags -{})",
            id,
            delta.attributes.len(),
            delta.media.is_some(),
            delta.remove_tags.len()
        );
    }
    Ok(written)
}
