//! Voice-message transcription: request, rating, and the asynchronous
//! completion push that resolves pending transcriptions.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use quill_db::Database;
use quill_engine::applier::{self, MessageDelta};
use quill_types::api::TranscriptionOutcome;
use quill_types::{AttributeKind, MessageAttribute, MessageId};

use crate::in_transaction;
use crate::transport::{RpcCall, RpcResponse, Transport};

/// Maps in-flight transcription ids back to the message they belong to.
///
/// Process-lifetime only; entries are never evicted.
#[derive(Default)]
pub struct AudioTranscriptionManager {
    pending: Mutex<HashMap<i64, MessageId>>,
}

impl AudioTranscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_pending_mapping(&self, transcription_id: i64, message_id: MessageId) {
        self.pending.lock().await.insert(transcription_id, message_id);
    }

    pub async fn pending_mapping(&self, transcription_id: i64) -> Option<MessageId> {
        self.pending.lock().await.get(&transcription_id).copied()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

pub struct TranscriptionClient {
    db: Arc<Database>,
    transport: Arc<dyn Transport>,
    manager: Arc<AudioTranscriptionManager>,
}

impl TranscriptionClient {
    pub fn new(db: Arc<Database>, transport: Arc<dyn Transport>, manager: Arc<AudioTranscriptionManager>) -> Self {
        Self {
            db,
            transport,
            manager,
        }
    }

    pub fn manager(&self) -> &Arc<AudioTranscriptionManager> {
        &self.manager
    }

    /// Requests a transcription for `id` and stores the result on the message.
    ///
    /// A failed request stores an empty attribute so stale text never lingers.
    /// Transport errors are reported only through the outcome.
    pub async fn transcribe_audio(&self, id: MessageId) -> Result<TranscriptionOutcome> {
        let peer_known = in_transaction(&self.db, move |tx| Ok(tx.get_peer(id.peer_id)?.is_some())).await?;
        if !peer_known {
            debug!("Transcription for {} skipped, unknown peer", id);
            return Ok(TranscriptionOutcome::Error);
        }

        let call = RpcCall::TranscribeAudio {
            peer: id.peer_id,
            msg_id: id.id,
        };
        let (attribute, outcome) = match self.transport.request(call).await {
            Ok(RpcResponse::TranscribedAudio { pending, transcription_id, text }) => {
                // Registered before the commit so an early push can resolve it.
                if pending {
                    self.manager.add_pending_mapping(transcription_id, id).await;
                }
                let attribute = MessageAttribute::AudioTranscription {
                    id: transcription_id,
                    text,
                    is_pending: pending,
                    did_rate: false,
                };
                (attribute, TranscriptionOutcome::Success)
            }
            Ok(other) => {
                warn!("Unexpected transcription response for {}: {:?}", id, other);
                (empty_transcription(), TranscriptionOutcome::Error)
            }
            Err(err) => {
                warn!("Transcription for {} failed: {}", id, err);
                (empty_transcription(), TranscriptionOutcome::Error)
            }
        };

        in_transaction(&self.db, move |tx| {
            let mut delta = MessageDelta::new();
            delta.replace(attribute);
            applier::apply(tx, id, &delta)
        })
        .await?;

        Ok(outcome)
    }

    /// Marks the transcription on `id` as rated, then reports the rating.
    ///
    /// Returns `false` when the message has no transcription or it was already
    /// rated; no call is made in that case. The remote result is ignored.
    pub async fn rate_transcription(&self, id: MessageId, transcription_id: i64, good: bool) -> Result<bool> {
        let (rated, peer_known) = in_transaction(&self.db, move |tx| {
            let Some(message) = tx.get_message(id)? else {
                return Ok((false, false));
            };
            let Some(MessageAttribute::AudioTranscription { id: current_id, text, is_pending, did_rate: false }) =
                message.attributes.get(AttributeKind::AudioTranscription).cloned()
            else {
                return Ok((false, false));
            };

            let mut delta = MessageDelta::new();
            delta.replace(MessageAttribute::AudioTranscription {
                id: current_id,
                text,
                is_pending,
                did_rate: true,
            });
            applier::apply(tx, id, &delta)?;
            Ok((true, tx.get_peer(id.peer_id)?.is_some()))
        })
        .await?;

        if !rated {
            return Ok(false);
        }
        if !peer_known {
            debug!("Rating for {} kept local, unknown peer", id);
            return Ok(true);
        }

        let call = RpcCall::RateTranscribedAudio {
            peer: id.peer_id,
            msg_id: id.id,
            transcription_id,
            good,
        };
        if let Err(err) = self.transport.request(call).await {
            warn!("Rating transcription {} failed: {}", transcription_id, err);
        }
        Ok(true)
    }

    /// Applies a pushed transcription update. Unknown ids are ignored.
    pub async fn apply_transcription_update(&self, transcription_id: i64, text: String, is_pending: bool) -> Result<bool> {
        let Some(id) = self.manager.pending_mapping(transcription_id).await else {
            debug!("No pending transcription {}, update ignored", transcription_id);
            return Ok(false);
        };

        in_transaction(&self.db, move |tx| {
            let Some(message) = tx.get_message(id)? else {
                return Ok(false);
            };
            let did_rate = matches!(
                message.attributes.get(AttributeKind::AudioTranscription),
                Some(MessageAttribute::AudioTranscription { did_rate: true, .. })
            );

            let mut delta = MessageDelta::new();
            delta.replace(MessageAttribute::AudioTranscription {
                id: transcription_id,
                text,
                is_pending,
                did_rate,
            });
            applier::apply(tx, id, &delta)
        })
        .await
    }
}

fn empty_transcription() -> MessageAttribute {
    MessageAttribute::AudioTranscription {
        id: 0,
        text: String::new(),
        is_pending: false,
        did_rate: false,
    }
}
