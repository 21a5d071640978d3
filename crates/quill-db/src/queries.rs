use std::collections::BTreeSet;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use tracing::debug;

use quill_types::models::{
    CachedPeerData, ForwardInfo, Media, MessageTag, Peer, StoreForwardInfo, StoreMessage,
};
use quill_types::secret_chat::{OutgoingSecretOperation, SecretChatState};
use quill_types::{
    AttributeSet, Message, MessageId, PeerId, PeerNamespace, PendingActionKind,
    PendingMessageAction,
};

use crate::models::{MessageRow, PeerRow};

/// Result of an `update_message` callback.
pub enum UpdateMessage {
    Update(StoreMessage),
    Skip,
}

/// Handle to an open store transaction. Only [`crate::Database::transaction`]
/// hands these out.
pub struct Transaction<'a> {
    conn: &'a Connection,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // -- Peers --

    pub fn get_peer(&self, peer_id: PeerId) -> Result<Option<Peer>> {
        let row = self
            .conn
            .query_row(
                "SELECT peer_namespace, peer_id, title FROM peers
                 WHERE peer_namespace = ?1 AND peer_id = ?2",
                params![peer_id.namespace.as_i32(), peer_id.id],
                |row| {
                    Ok(PeerRow {
                        peer_namespace: row.get(0)?,
                        peer_id: row.get(1)?,
                        title: row.get(2)?,
                    })
                },
            )
            .optional()?;

        row.map(|row| {
            Ok(Peer {
                id: peer_id_from_parts(row.peer_namespace, row.peer_id)?,
                title: row.title,
            })
        })
        .transpose()
    }

    pub fn put_peer(&self, peer: &Peer) -> Result<()> {
        self.conn.execute(
            "INSERT INTO peers (peer_namespace, peer_id, title) VALUES (?1, ?2, ?3)
             ON CONFLICT(peer_namespace, peer_id) DO UPDATE SET title = excluded.title",
            params![peer.id.namespace.as_i32(), peer.id.id, peer.title],
        )?;
        Ok(())
    }

    // -- Messages --

    pub fn get_message(&self, id: MessageId) -> Result<Option<Message>> {
        let row = self
            .conn
            .query_row(
                "SELECT peer_namespace, peer_id, namespace, id, globally_unique_id, timestamp,
                        incoming, tags, forward_info, author_id, text, attributes, media
                 FROM messages
                 WHERE peer_namespace = ?1 AND peer_id = ?2 AND namespace = ?3 AND id = ?4",
                params![id.peer_id.namespace.as_i32(), id.peer_id.id, id.namespace, id.id],
                |row| {
                    Ok(MessageRow {
                        peer_namespace: row.get(0)?,
                        peer_id: row.get(1)?,
                        namespace: row.get(2)?,
                        id: row.get(3)?,
                        globally_unique_id: row.get(4)?,
                        timestamp: row.get(5)?,
                        incoming: row.get(6)?,
                        tags: row.get(7)?,
                        forward_info: row.get(8)?,
                        author_id: row.get(9)?,
                        text: row.get(10)?,
                        attributes: row.get(11)?,
                        media: row.get(12)?,
                    })
                },
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(self.message_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Inserts or fully replaces a message record.
    pub fn store_message(&self, message: &StoreMessage) -> Result<()> {
        let forward_info = message
            .forward_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let author_id = message.author_id.as_ref().map(serde_json::to_string).transpose()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO messages
                (peer_namespace, peer_id, namespace, id, globally_unique_id, timestamp, incoming,
                 tags, forward_info, author_id, text, attributes, media)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                message.id.peer_id.namespace.as_i32(),
                message.id.peer_id.id,
                message.id.namespace,
                message.id.id,
                message.globally_unique_id,
                message.timestamp,
                message.incoming,
                serde_json::to_string(&message.tags)?,
                forward_info,
                author_id,
                message.text,
                serde_json::to_string(&message.attributes)?,
                serde_json::to_string(&message.media)?,
            ],
        )?;
        Ok(())
    }

    /// Reads the message, lets `f` decide on a replacement, and writes it back.
    /// Returns whether a record was written. A missing message is not an error.
    pub fn update_message<F>(&self, id: MessageId, f: F) -> Result<bool>
    where
        F: FnOnce(&Message) -> UpdateMessage,
    {
        let Some(current) = self.get_message(id)? else {
            return Ok(false);
        };

        match f(&current) {
            UpdateMessage::Update(updated) => {
                if updated.id != id {
                    return Err(anyhow!("update for {} tried to rewrite id to {}", id, updated.id));
                }
                self.store_message(&updated)?;
                debug!("Message {} updated", id);
                Ok(true)
            }
            UpdateMessage::Skip => Ok(false),
        }
    }

    fn message_from_row(&self, row: MessageRow) -> Result<Message> {
        let peer_id = peer_id_from_parts(row.peer_namespace, row.peer_id)?;
        let tags: BTreeSet<MessageTag> = serde_json::from_str(&row.tags)?;
        let attributes: AttributeSet = serde_json::from_str(&row.attributes)?;
        let media: Vec<Media> = serde_json::from_str(&row.media)?;
        let author_id: Option<PeerId> = row
            .author_id
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        let forward_info = match row.forward_info.as_deref() {
            Some(json) => {
                let stored: StoreForwardInfo = serde_json::from_str(json)?;
                Some(self.resolve_forward_info(stored)?)
            }
            None => None,
        };

        Ok(Message {
            id: MessageId::new(peer_id, row.namespace, row.id),
            globally_unique_id: row.globally_unique_id,
            timestamp: row.timestamp,
            incoming: row.incoming,
            tags,
            forward_info,
            author_id,
            text: row.text,
            attributes,
            media,
        })
    }

    fn resolve_forward_info(&self, stored: StoreForwardInfo) -> Result<ForwardInfo> {
        // Unknown peers keep their id with an empty title so the header survives a rewrite.
        let resolve = |peer_id: Option<PeerId>| -> Result<Option<Peer>> {
            match peer_id {
                Some(id) => Ok(Some(self.get_peer(id)?.unwrap_or(Peer {
                    id,
                    title: String::new(),
                }))),
                None => Ok(None),
            }
        };

        Ok(ForwardInfo {
            author: resolve(stored.author_id)?,
            source: resolve(stored.source_id)?,
            source_message_id: stored.source_message_id,
            date: stored.date,
            author_signature: stored.author_signature,
            psa_type: stored.psa_type,
            flags: stored.flags,
        })
    }

    // -- Peer chat state --

    pub fn get_peer_chat_state(&self, peer_id: PeerId) -> Result<Option<SecretChatState>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT state FROM peer_chat_states WHERE peer_namespace = ?1 AND peer_id = ?2",
                params![peer_id.namespace.as_i32(), peer_id.id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.as_deref().map(serde_json::from_str).transpose()?)
    }

    pub fn set_peer_chat_state(&self, peer_id: PeerId, state: &SecretChatState) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO peer_chat_states (peer_namespace, peer_id, state)
             VALUES (?1, ?2, ?3)",
            params![peer_id.namespace.as_i32(), peer_id.id, serde_json::to_string(state)?],
        )?;
        Ok(())
    }

    // -- Peer cached data --

    pub fn get_peer_cached_data(&self, peer_id: PeerId) -> Result<Option<CachedPeerData>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM peer_cached_data WHERE peer_namespace = ?1 AND peer_id = ?2",
                params![peer_id.namespace.as_i32(), peer_id.id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.as_deref().map(serde_json::from_str).transpose()?)
    }

    /// Applies `f` to each peer's cached data. Returning `None` deletes the entry.
    pub fn update_peer_cached_data<F>(&self, peer_ids: &[PeerId], mut f: F) -> Result<()>
    where
        F: FnMut(PeerId, Option<CachedPeerData>) -> Option<CachedPeerData>,
    {
        for &peer_id in peer_ids {
            let current = self.get_peer_cached_data(peer_id)?;
            match f(peer_id, current) {
                Some(data) => {
                    self.conn.execute(
                        "INSERT OR REPLACE INTO peer_cached_data (peer_namespace, peer_id, data)
                         VALUES (?1, ?2, ?3)",
                        params![peer_id.namespace.as_i32(), peer_id.id, serde_json::to_string(&data)?],
                    )?;
                }
                None => {
                    self.conn.execute(
                        "DELETE FROM peer_cached_data WHERE peer_namespace = ?1 AND peer_id = ?2",
                        params![peer_id.namespace.as_i32(), peer_id.id],
                    )?;
                }
            }
        }
        Ok(())
    }

    // -- Pending actions --

    /// Records (`Some`) or clears (`None`) the marker for `(kind, id)`.
    pub fn set_pending_message_action(
        &self,
        kind: PendingActionKind,
        id: MessageId,
        action: Option<PendingMessageAction>,
    ) -> Result<()> {
        match action {
            Some(action) => {
                self.conn.execute(
                    "INSERT OR REPLACE INTO pending_message_actions
                        (kind, peer_namespace, peer_id, namespace, id, action)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        kind.as_str(),
                        id.peer_id.namespace.as_i32(),
                        id.peer_id.id,
                        id.namespace,
                        id.id,
                        serde_json::to_string(&action)?,
                    ],
                )?;
            }
            None => {
                self.conn.execute(
                    "DELETE FROM pending_message_actions
                     WHERE kind = ?1 AND peer_namespace = ?2 AND peer_id = ?3
                       AND namespace = ?4 AND id = ?5",
                    params![
                        kind.as_str(),
                        id.peer_id.namespace.as_i32(),
                        id.peer_id.id,
                        id.namespace,
                        id.id,
                    ],
                )?;
            }
        }
        Ok(())
    }

    pub fn pending_message_actions(&self, kind: PendingActionKind) -> Result<Vec<MessageId>> {
        let mut stmt = self.conn.prepare(
            "SELECT peer_namespace, peer_id, namespace, id FROM pending_message_actions
             WHERE kind = ?1
             ORDER BY peer_namespace, peer_id, namespace, id",
        )?;

        let rows = stmt
            .query_map([kind.as_str()], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, i32>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(peer_ns, peer_id, namespace, id)| {
                Ok(MessageId::new(peer_id_from_parts(peer_ns, peer_id)?, namespace, id))
            })
            .collect()
    }

    // -- Outgoing secret-chat queue --

    pub fn add_secret_outgoing_operation(
        &self,
        peer_id: PeerId,
        operation: &OutgoingSecretOperation,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO secret_outgoing_operations (peer_namespace, peer_id, operation)
             VALUES (?1, ?2, ?3)",
            params![peer_id.namespace.as_i32(), peer_id.id, serde_json::to_string(operation)?],
        )?;
        Ok(())
    }

    /// Queued operations for `peer_id`, oldest first.
    pub fn secret_outgoing_operations(&self, peer_id: PeerId) -> Result<Vec<OutgoingSecretOperation>> {
        let mut stmt = self.conn.prepare(
            "SELECT operation FROM secret_outgoing_operations
             WHERE peer_namespace = ?1 AND peer_id = ?2
             ORDER BY seq",
        )?;

        let rows = stmt
            .query_map(params![peer_id.namespace.as_i32(), peer_id.id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|json| Ok(serde_json::from_str(json)?))
            .collect()
    }

    /// Removes and returns everything queued for `peer_id`.
    pub fn take_secret_outgoing_operations(
        &self,
        peer_id: PeerId,
    ) -> Result<Vec<OutgoingSecretOperation>> {
        let operations = self.secret_outgoing_operations(peer_id)?;
        self.conn.execute(
            "DELETE FROM secret_outgoing_operations WHERE peer_namespace = ?1 AND peer_id = ?2",
            params![peer_id.namespace.as_i32(), peer_id.id],
        )?;
        Ok(operations)
    }

    // -- Synchronize consumed contents --

    pub fn add_synchronize_consume_contents(&self, message_ids: &[MessageId]) -> Result<()> {
        if message_ids.is_empty() {
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO synchronize_consume_jobs (message_ids) VALUES (?1)",
            [serde_json::to_string(message_ids)?],
        )?;
        Ok(())
    }

    pub fn synchronize_consume_jobs(&self) -> Result<Vec<Vec<MessageId>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT message_ids FROM synchronize_consume_jobs ORDER BY seq")?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|json| Ok(serde_json::from_str(json)?))
            .collect()
    }

    /// Removes and returns all queued jobs, oldest first.
    pub fn take_synchronize_consume_jobs(&self) -> Result<Vec<Vec<MessageId>>> {
        let jobs = self.synchronize_consume_jobs()?;
        self.conn.execute("DELETE FROM synchronize_consume_jobs", [])?;
        Ok(jobs)
    }
}

fn peer_id_from_parts(namespace: i32, id: i64) -> Result<PeerId> {
    let namespace = PeerNamespace::from_i32(namespace)
        .ok_or_else(|| anyhow!("Corrupt peer namespace {} for peer {}", namespace, id))?;
    Ok(PeerId::new(namespace, id))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use quill_types::MessageAttribute;
    use quill_types::ids::namespaces;
    use quill_types::secret_chat::{SecretChatEmbeddedState, SecretChatLayer, SecretChatRole};

    fn user(id: i64) -> PeerId {
        PeerId::new(PeerNamespace::User, id)
    }

    fn sample(id: MessageId) -> StoreMessage {
        StoreMessage {
            id,
            globally_unique_id: Some(99),
            timestamp: 1_700_000_000,
            incoming: true,
            tags: BTreeSet::from([MessageTag::UnseenReaction]),
            forward_info: Some(StoreForwardInfo {
                author_id: Some(user(7)),
                source_id: None,
                source_message_id: None,
                date: 1_600_000_000,
                author_signature: Some("ed".into()),
                psa_type: None,
                flags: 0,
            }),
            author_id: Some(user(7)),
            text: "hello".into(),
            attributes: AttributeSet::from(vec![MessageAttribute::ConsumableContent { consumed: false }]),
            media: vec![Media::Image { id: 3 }],
        }
    }

    #[test]
    fn message_round_trip_resolves_forward_peers() {
        let db = Database::open_in_memory().unwrap();
        let id = MessageId::new(user(1), namespaces::CLOUD, 10);

        db.transaction(|tx| {
            tx.put_peer(&Peer { id: user(7), title: "Edith".into() })?;
            tx.store_message(&sample(id))
        })
        .unwrap();

        let message = db.transaction(|tx| tx.get_message(id)).unwrap().unwrap();
        let forward = message.forward_info.clone().unwrap();
        assert_eq!(forward.author.unwrap().title, "Edith");
        assert_eq!(StoreMessage::from(&message), sample(id));
    }

    #[test]
    fn update_message_on_missing_id_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let id = MessageId::new(user(1), namespaces::CLOUD, 404);
        let written = db
            .transaction(|tx| tx.update_message(id, |m| UpdateMessage::Update(StoreMessage::from(m))))
            .unwrap();
        assert!(!written);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let id = MessageId::new(user(1), namespaces::CLOUD, 11);

        let result: Result<()> = db.transaction(|tx| {
            tx.store_message(&sample(id))?;
            Err(anyhow!("boom"))
        });
        assert!(result.is_err());
        assert!(db.transaction(|tx| tx.get_message(id)).unwrap().is_none());
    }

    #[test]
    fn pending_actions_set_and_clear() {
        let db = Database::open_in_memory().unwrap();
        let id = MessageId::new(user(1), namespaces::CLOUD, 12);
        let kind = PendingActionKind::ReadReaction;

        db.transaction(|tx| {
            tx.set_pending_message_action(kind, id, Some(PendingMessageAction { recorded_at: 5 }))
        })
        .unwrap();
        assert_eq!(db.transaction(|tx| tx.pending_message_actions(kind)).unwrap(), vec![id]);

        db.transaction(|tx| tx.set_pending_message_action(kind, id, None)).unwrap();
        assert!(db.transaction(|tx| tx.pending_message_actions(kind)).unwrap().is_empty());
    }

    #[test]
    fn chat_state_and_queues_persist() {
        let db = Database::open_in_memory().unwrap();
        let peer = PeerId::new(PeerNamespace::SecretChat, 3);
        let state = SecretChatState {
            role: SecretChatRole::Creator,
            embedded_state: SecretChatEmbeddedState::BasicLayer,
        };
        let op = OutgoingSecretOperation::ReadMessagesContent {
            layer: SecretChatLayer::Layer8,
            action_globally_unique_id: 1,
            globally_unique_ids: vec![2],
        };

        db.transaction(|tx| {
            tx.set_peer_chat_state(peer, &state)?;
            tx.add_secret_outgoing_operation(peer, &op)?;
            tx.add_synchronize_consume_contents(&[MessageId::new(user(1), namespaces::CLOUD, 1)])
        })
        .unwrap();

        db.transaction(|tx| {
            assert_eq!(tx.get_peer_chat_state(peer)?, Some(state.clone()));
            assert_eq!(tx.take_secret_outgoing_operations(peer)?, vec![op.clone()]);
            assert!(tx.secret_outgoing_operations(peer)?.is_empty());
            assert_eq!(tx.take_synchronize_consume_jobs()?.len(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn cached_data_update_can_delete() {
        let db = Database::open_in_memory().unwrap();
        let peer = user(4);

        db.transaction(|tx| {
            tx.update_peer_cached_data(&[peer], |_, current| {
                let mut data = current.unwrap_or_default();
                data.translations_hidden = true;
                Some(data)
            })
        })
        .unwrap();
        let data = db.transaction(|tx| tx.get_peer_cached_data(peer)).unwrap();
        assert!(data.unwrap().translations_hidden);

        db.transaction(|tx| tx.update_peer_cached_data(&[peer], |_, _| None)).unwrap();
        assert!(db.transaction(|tx| tx.get_peer_cached_data(peer)).unwrap().is_none());
    }
}
