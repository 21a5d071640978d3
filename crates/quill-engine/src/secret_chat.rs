//! Encrypted-channel signaling for secret chats, encoded for the negotiated layer.

use anyhow::Result;
use tracing::debug;

use quill_db::Transaction;
use quill_types::PeerId;
use quill_types::secret_chat::{
    BASIC_LAYER, CURRENT_LAYER, OutgoingSecretOperation, SecretChatEmbeddedState, SecretChatLayer,
    SecretChatState,
};

/// Layer outgoing operations must target, or `None` if nothing may be sent yet.
pub fn resolve_layer(state: &SecretChatState) -> Option<SecretChatLayer> {
    match &state.embedded_state {
        SecretChatEmbeddedState::Terminated | SecretChatEmbeddedState::Handshake => None,
        SecretChatEmbeddedState::BasicLayer => Some(BASIC_LAYER),
        SecretChatEmbeddedState::SequenceBased(sequence) => {
            Some(sequence.active_layer.secret_chat_layer())
        }
    }
}

/// Appends `operation` to the chat's outgoing queue and returns the state the
/// chat should have afterwards.
///
/// The first operation on a sequence-based chat is followed by a report of
/// the layer this client supports.
pub fn add_outgoing_operation(
    tx: &Transaction<'_>,
    peer_id: PeerId,
    operation: &OutgoingSecretOperation,
    state: &SecretChatState,
) -> Result<SecretChatState> {
    tx.add_secret_outgoing_operation(peer_id, operation)?;

    let mut updated = state.clone();
    if let SecretChatEmbeddedState::SequenceBased(sequence) = &mut updated.embedded_state {
        if !sequence.layer_support_reported {
            let report = OutgoingSecretOperation::ReportLayerSupport {
                layer: sequence.active_layer.secret_chat_layer(),
                action_globally_unique_id: rand::random::<i64>(),
                layer_support: CURRENT_LAYER,
            };
            tx.add_secret_outgoing_operation(peer_id, &report)?;
            sequence.layer_support_reported = true;
        }
    }
    Ok(updated)
}

/// Queues a "mark read" for `globally_unique_ids` in the secret chat `peer_id`.
///
/// Returns `false` when the chat has no state or no negotiated layer; the
/// signal is dropped in that case.
pub fn signal_read_messages_content(
    tx: &Transaction<'_>,
    peer_id: PeerId,
    globally_unique_ids: &[i64],
) -> Result<bool> {
    if globally_unique_ids.is_empty() {
        return Ok(false);
    }

    let Some(state) = tx.get_peer_chat_state(peer_id)? else {
        debug!("No chat state for secret chat {}, read signal dropped", peer_id);
        return Ok(false);
    };
    let Some(layer) = resolve_layer(&state) else {
        debug!("Secret chat {} has no negotiated layer, read signal dropped", peer_id);
        return Ok(false);
    };

    let operation = OutgoingSecretOperation::ReadMessagesContent {
        layer,
        action_globally_unique_id: rand::random::<i64>(),
        globally_unique_ids: globally_unique_ids.to_vec(),
    };
    let updated = add_outgoing_operation(tx, peer_id, &operation, &state)?;
    if updated != state {
        tx.set_peer_chat_state(peer_id, &updated)?;
    }

    debug!("Queued read-content signal for {} at layer {}", peer_id, layer.number());
    Ok(true)
}
