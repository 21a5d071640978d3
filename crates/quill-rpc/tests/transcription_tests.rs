mod common;

use std::sync::Arc;

use common::*;
use quill_rpc::{AudioTranscriptionManager, RpcCall, RpcError, RpcResponse, TranscriptionClient};
use quill_types::api::TranscriptionOutcome;
use quill_types::models::{FileKind, FileMedia};
use quill_types::{AttributeKind, Media, MessageAttribute, MessageId, PeerNamespace};

fn voice_note() -> Media {
    Media::File(FileMedia {
        id: 3,
        mime_type: "audio/ogg".into(),
        size: Some(4096),
        kind: FileKind::Voice { duration: 9 },
    })
}

fn transcription(id: i64, text: &str, is_pending: bool, did_rate: bool) -> MessageAttribute {
    MessageAttribute::AudioTranscription {
        id,
        text: text.into(),
        is_pending,
        did_rate,
    }
}

struct Setup {
    db: Arc<quill_db::Database>,
    transport: Arc<ScriptedTransport>,
    client: TranscriptionClient,
    id: MessageId,
}

fn setup(known_peer: bool, attributes: Vec<MessageAttribute>) -> Setup {
    let db = open_db();
    let chat = peer(PeerNamespace::User, 42);
    if known_peer {
        put_peer(&db, chat);
    }
    let id = message_id(chat, 7);
    put_message(&db, id, attributes, vec![voice_note()]);

    let transport = ScriptedTransport::new();
    let client = TranscriptionClient::new(db.clone(), transport.clone(), Arc::new(AudioTranscriptionManager::new()));
    Setup { db, transport, client, id }
}

fn stored_transcription(s: &Setup) -> Option<MessageAttribute> {
    get_message(&s.db, s.id)
        .attributes
        .get(AttributeKind::AudioTranscription)
        .cloned()
}

#[tokio::test]
async fn completed_transcription_is_stored() {
    let s = setup(true, vec![]);
    s.transport
        .push(Ok(RpcResponse::TranscribedAudio { pending: false, transcription_id: 900, text: "hello there".into() }))
        .await;

    let outcome = s.client.transcribe_audio(s.id).await.unwrap();

    assert_eq!(outcome, TranscriptionOutcome::Success);
    assert_eq!(stored_transcription(&s), Some(transcription(900, "hello there", false, false)));
    assert_eq!(s.client.manager().pending_count().await, 0);
    assert_eq!(
        s.transport.calls().await,
        vec![RpcCall::TranscribeAudio { peer: s.id.peer_id, msg_id: 7 }]
    );
}

#[tokio::test]
async fn pending_transcription_resolves_through_push() {
    let s = setup(true, vec![]);
    s.transport
        .push(Ok(RpcResponse::TranscribedAudio { pending: true, transcription_id: 901, text: "hel".into() }))
        .await;

    s.client.transcribe_audio(s.id).await.unwrap();
    assert_eq!(s.client.manager().pending_mapping(901).await, Some(s.id));
    assert_eq!(stored_transcription(&s), Some(transcription(901, "hel", true, false)));

    let applied = s
        .client
        .apply_transcription_update(901, "hello world".into(), false)
        .await
        .unwrap();
    assert!(applied);
    assert_eq!(stored_transcription(&s), Some(transcription(901, "hello world", false, false)));
}

#[tokio::test]
async fn unknown_push_is_ignored() {
    let s = setup(true, vec![transcription(5, "old", false, false)]);
    let applied = s.client.apply_transcription_update(12345, "late".into(), false).await.unwrap();
    assert!(!applied);
    assert_eq!(stored_transcription(&s), Some(transcription(5, "old", false, false)));
}

#[tokio::test]
async fn failed_transcription_stores_empty_attribute() {
    let s = setup(true, vec![transcription(5, "stale", false, true)]);
    s.transport.push(Err(RpcError::new(400, "TRANSCRIPTION_FAILED"))).await;

    let outcome = s.client.transcribe_audio(s.id).await.unwrap();

    assert_eq!(outcome, TranscriptionOutcome::Error);
    assert_eq!(stored_transcription(&s), Some(transcription(0, "", false, false)));
}

#[tokio::test]
async fn unknown_peer_fails_without_request() {
    let s = setup(false, vec![]);

    let outcome = s.client.transcribe_audio(s.id).await.unwrap();

    assert_eq!(outcome, TranscriptionOutcome::Error);
    assert!(s.transport.calls().await.is_empty());
    assert_eq!(stored_transcription(&s), None);
}

#[tokio::test]
async fn rating_is_applied_once() {
    let s = setup(true, vec![transcription(900, "hello", false, false)]);
    // The rating call fails; the local flag stays set regardless.
    s.transport.push(Err(RpcError::network("timeout"))).await;

    assert!(s.client.rate_transcription(s.id, 900, true).await.unwrap());
    assert_eq!(stored_transcription(&s), Some(transcription(900, "hello", false, true)));

    assert!(!s.client.rate_transcription(s.id, 900, false).await.unwrap());
    assert_eq!(stored_transcription(&s), Some(transcription(900, "hello", false, true)));

    assert_eq!(
        s.transport.calls().await,
        vec![RpcCall::RateTranscribedAudio { peer: s.id.peer_id, msg_id: 7, transcription_id: 900, good: true }]
    );
}

#[tokio::test]
async fn rating_with_unknown_peer_stays_local() {
    let s = setup(false, vec![transcription(900, "hello", false, false)]);

    assert!(s.client.rate_transcription(s.id, 900, true).await.unwrap());
    assert_eq!(stored_transcription(&s), Some(transcription(900, "hello", false, true)));
    assert!(s.transport.calls().await.is_empty());
}

#[tokio::test]
async fn push_keeps_rating() {
    let s = setup(true, vec![]);
    s.transport
        .push(Ok(RpcResponse::TranscribedAudio { pending: true, transcription_id: 77, text: "a".into() }))
        .await;
    s.transport.push(Ok(RpcResponse::Bool { value: true })).await;

    s.client.transcribe_audio(s.id).await.unwrap();
    s.client.rate_transcription(s.id, 77, false).await.unwrap();
    s.client.apply_transcription_update(77, "abc".into(), false).await.unwrap();

    assert_eq!(stored_transcription(&s), Some(transcription(77, "abc", false, true)));
}
