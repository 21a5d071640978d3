//! Read/seen state for message content, mentions and reactions, and the
//! remote acknowledgements each change owes.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use quill_db::{Database, Transaction};
use quill_types::models::MessageTag;
use quill_types::{
    AttributeKind, MessageAttribute, MessageId, PendingActionKind, PendingMessageAction,
};

use crate::applier::{self, MessageDelta};
use crate::clock::Clock;
use crate::expiration::{self, ExpiryCheck};
use crate::secret_chat;

/// Entry point for consumption triggers. Each call runs in one transaction.
#[derive(Clone)]
pub struct ConsumptionTracker {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl ConsumptionTracker {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// The local user viewed the content of `id`.
    pub fn mark_content_consumed(&self, id: MessageId) -> Result<bool> {
        let now = self.clock.now();
        self.db.transaction(|tx| mark_content_consumed_in(tx, id, now))
    }

    /// The local user saw the reactions on `id`.
    pub fn mark_reactions_seen(&self, id: MessageId) -> Result<bool> {
        let now = self.clock.now();
        self.db.transaction(|tx| mark_reactions_seen_in(tx, id, now))
    }

    /// The server reported `id` as consumed, optionally at `consume_date`.
    pub fn mark_consumed_remotely(&self, id: MessageId, consume_date: Option<i32>) -> Result<bool> {
        let now = self.clock.now();
        self.db
            .transaction(|tx| mark_consumed_remotely_in(tx, id, consume_date, now))
    }
}

/// Interactive consumption of an incoming message.
///
/// Flips unconsumed content, marks mentions consumed with a deferred
/// acknowledgement, and starts self-destruct countdowns at `now`. Secret chats
/// get an encrypted read signal; other chats get a sync job for the content.
pub fn mark_content_consumed_in(tx: &Transaction<'_>, id: MessageId, now: i32) -> Result<bool> {
    let Some(message) = tx.get_message(id)? else {
        return Ok(false);
    };
    if !message.incoming {
        return Ok(false);
    }

    let secret = message.is_secret_chat();
    let mut delta = MessageDelta::new();
    let mut content_consumed = false;

    for attribute in &message.attributes {
        match attribute {
            MessageAttribute::ConsumableContent { consumed: false } => {
                delta.replace(MessageAttribute::ConsumableContent { consumed: true });
                content_consumed = true;
            }
            MessageAttribute::ConsumablePersonalMention { consumed: false, .. } => {
                tx.set_pending_message_action(
                    PendingActionKind::ConsumeUnseenPersonalMessage,
                    id,
                    Some(PendingMessageAction { recorded_at: now }),
                )?;
                delta.replace(MessageAttribute::ConsumablePersonalMention {
                    consumed: true,
                    pending: true,
                });
            }
            _ => {}
        }
    }

    let countdown = expiration::begin_countdown(&message, now, ExpiryCheck::Deferred);
    let countdown_started = countdown.started();
    for timer in countdown.timers {
        delta.replace(timer);
    }

    if secret {
        if content_consumed || countdown_started {
            match message.globally_unique_id {
                Some(globally_unique_id) => {
                    secret_chat::signal_read_messages_content(tx, id.peer_id, &[globally_unique_id])?;
                }
                None => debug!("Secret message {} has no globally unique id, no read signal", id),
            }
        }
    } else if content_consumed {
        tx.add_synchronize_consume_contents(&[id])?;
    }

    applier::apply(tx, id, &delta)
}

/// Clears unseen reactions on a message tagged as having them.
pub fn mark_reactions_seen_in(tx: &Transaction<'_>, id: MessageId, now: i32) -> Result<bool> {
    let Some(message) = tx.get_message(id)? else {
        return Ok(false);
    };
    if !message.tags.contains(&MessageTag::UnseenReaction) {
        return Ok(false);
    }

    let mut delta = MessageDelta::new();
    if let Some(MessageAttribute::Reactions(reactions)) = message.attributes.get(AttributeKind::Reactions) {
        if reactions.has_unseen() {
            delta.replace(MessageAttribute::Reactions(reactions.with_all_seen()));
            delta.remove_tag(MessageTag::UnseenReaction);

            if !message.is_secret_chat() {
                tx.set_pending_message_action(
                    PendingActionKind::ReadReaction,
                    id,
                    Some(PendingMessageAction { recorded_at: now }),
                )?;
            }
        }
    }

    applier::apply(tx, id, &delta)
}

/// Consumption reported by the server.
///
/// Settles content and mention state (dropping any deferred mention
/// acknowledgement), starts countdowns anchored at `consume_date` or `now`,
/// and expires the media right away if the timer has already run out.
pub fn mark_consumed_remotely_in(
    tx: &Transaction<'_>,
    id: MessageId,
    consume_date: Option<i32>,
    now: i32,
) -> Result<bool> {
    let Some(message) = tx.get_message(id)? else {
        return Ok(false);
    };

    let mut delta = MessageDelta::new();

    for attribute in &message.attributes {
        match *attribute {
            MessageAttribute::ConsumableContent { consumed: false } => {
                delta.replace(MessageAttribute::ConsumableContent { consumed: true });
            }
            MessageAttribute::ConsumablePersonalMention { consumed, pending } if !consumed || pending => {
                if pending {
                    tx.set_pending_message_action(PendingActionKind::ConsumeUnseenPersonalMessage, id, None)?;
                }
                delta.replace(MessageAttribute::ConsumablePersonalMention {
                    consumed: true,
                    pending: false,
                });
                delta.remove_tag(MessageTag::UnseenPersonalMessage);
            }
            _ => {}
        }
    }

    let anchor = consume_date.unwrap_or(now);
    let countdown = expiration::begin_countdown(&message, anchor, ExpiryCheck::Immediate { now });
    for timer in countdown.timers {
        delta.replace(timer);
    }
    if let Some(media) = countdown.expired_media {
        delta.set_media(media);
    }

    applier::apply(tx, id, &delta)
}
