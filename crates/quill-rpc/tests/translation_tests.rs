mod common;

use common::*;
use quill_rpc::{RpcCall, RpcError, RpcResponse, TranslationClient, TranslationError};
use quill_types::attributes::TranslationAttribute;
use quill_types::models::{Poll, PollOption};
use quill_types::{AttributeKind, Media, MessageAttribute, PeerNamespace, TextWithEntities};

fn texts(values: &[&str]) -> RpcResponse {
    RpcResponse::TranslatedText {
        texts: values.iter().copied().map(TextWithEntities::plain).collect(),
    }
}

fn quiz() -> Media {
    Media::Poll(Poll {
        id: 77,
        question: TextWithEntities::plain("Which?"),
        options: vec![
            PollOption { text: TextWithEntities::plain("Left"), opaque_id: "0".into() },
            PollOption { text: TextWithEntities::plain("Right"), opaque_id: "1".into() },
        ],
        solution: Some(TextWithEntities::plain("Left, obviously")),
    })
}

#[tokio::test]
async fn legacy_translate_swallows_errors() {
    let transport = ScriptedTransport::new();
    transport.push(Err(RpcError::new(420, "FLOOD_WAIT_30"))).await;
    transport.push(Ok(RpcResponse::TranslateNoResult)).await;
    transport.push(Ok(texts(&["Hallo"]))).await;
    let client = TranslationClient::new(open_db(), transport.clone());

    assert_eq!(client.translate("Hello", None, "de").await, None);
    assert_eq!(client.translate("Hello", None, "de").await, None);
    assert_eq!(client.translate("Hello", Some("en"), "de").await, Some("Hallo".into()));

    let calls = transport.calls().await;
    assert!(matches!(
        &calls[2],
        RpcCall::TranslateText { peer: None, from_lang: Some(from), to_lang, .. } if from == "en" && to_lang == "de"
    ));
}

#[tokio::test]
async fn flood_wait_maps_to_limit_exceeded() {
    let transport = ScriptedTransport::new();
    transport.push(Err(RpcError::new(420, "FLOOD_WAIT_30"))).await;
    let client = TranslationClient::new(open_db(), transport);

    let result = client
        .translate_structured(vec![TextWithEntities::plain("Hello")], "de")
        .await;
    assert_eq!(result, Err(TranslationError::LimitExceeded));
}

#[tokio::test]
async fn structured_translation_keeps_order() {
    let transport = ScriptedTransport::new();
    transport.push(Ok(texts(&["eins", "zwei"]))).await;
    let client = TranslationClient::new(open_db(), transport);

    let result = client
        .translate_structured(vec![TextWithEntities::plain("one"), TextWithEntities::plain("two")], "de")
        .await
        .unwrap();
    assert_eq!(result, vec![TextWithEntities::plain("eins"), TextWithEntities::plain("zwei")]);
}

#[tokio::test]
async fn structured_translation_rejects_short_response() {
    let transport = ScriptedTransport::new();
    transport.push(Ok(texts(&["eins"]))).await;
    let client = TranslationClient::new(open_db(), transport);

    let result = client
        .translate_structured(vec![TextWithEntities::plain("one"), TextWithEntities::plain("two")], "de")
        .await;
    assert_eq!(result, Err(TranslationError::Generic));
}

#[tokio::test]
async fn poll_is_translated_in_one_batch() {
    let db = open_db();
    let chat = peer(PeerNamespace::Group, 10);
    let id = message_id(chat, 5);
    put_message(&db, id, vec![], vec![quiz()]);

    let transport = ScriptedTransport::new();
    transport.push(Ok(texts(&["Welche?", "Links", "Rechts", "Links, klar"]))).await;
    let client = TranslationClient::new(db.clone(), transport.clone());

    client.translate_messages(&[id], "de").await.unwrap();

    let calls = transport.calls().await;
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        RpcCall::TranslateText { text: Some(parts), msg_ids, .. } => {
            assert!(msg_ids.is_empty());
            let parts: Vec<&str> = parts.iter().map(|p| p.text.as_str()).collect();
            assert_eq!(parts, vec!["Which?", "Left", "Right", "Left, obviously"]);
        }
        other => panic!("unexpected call {:?}", other),
    }

    let message = get_message(&db, id);
    assert_eq!(
        message.attributes.get(AttributeKind::Translation),
        Some(&MessageAttribute::Translation(TranslationAttribute {
            text: "Welche?".into(),
            entities: vec![],
            to_lang: "de".into(),
            additional: vec![TextWithEntities::plain("Links"), TextWithEntities::plain("Rechts")],
            poll_solution: Some(TextWithEntities::plain("Links, klar")),
        }))
    );
}

#[tokio::test]
async fn regular_messages_are_grouped_per_peer() {
    let db = open_db();
    let first = peer(PeerNamespace::User, 1);
    let second = peer(PeerNamespace::Channel, 2);
    let a = message_id(first, 11);
    let b = message_id(first, 12);
    let c = message_id(second, 13);
    for id in [a, b, c] {
        put_message(&db, id, vec![], vec![]);
    }

    let transport = ScriptedTransport::new();
    transport.push(Ok(texts(&["A", "B"]))).await;
    transport.push(Ok(texts(&["C"]))).await;
    let client = TranslationClient::new(db.clone(), transport.clone());

    client.translate_messages(&[c, a, b], "es").await.unwrap();

    let calls = transport.calls().await;
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        &calls[0],
        RpcCall::TranslateText { peer: Some(p), msg_ids, text: None, .. } if *p == first && msg_ids == &vec![11, 12]
    ));

    let translated = |id| match get_message(&db, id).attributes.get(AttributeKind::Translation) {
        Some(MessageAttribute::Translation(t)) => t.text.clone(),
        other => panic!("missing translation: {:?}", other),
    };
    assert_eq!(translated(a), "A");
    assert_eq!(translated(b), "B");
    assert_eq!(translated(c), "C");
}

#[tokio::test]
async fn message_translation_surfaces_typed_errors() {
    let db = open_db();
    let id = message_id(peer(PeerNamespace::User, 1), 1);
    put_message(&db, id, vec![], vec![]);

    let transport = ScriptedTransport::new();
    transport.push(Err(RpcError::new(400, "MSG_ID_INVALID"))).await;
    let client = TranslationClient::new(db.clone(), transport);

    assert_eq!(
        client.translate_messages(&[id], "de").await,
        Err(TranslationError::InvalidMessageId)
    );
    assert!(get_message(&db, id).attributes.get(AttributeKind::Translation).is_none());
}

#[tokio::test]
async fn unknown_messages_issue_no_request() {
    let transport = ScriptedTransport::new();
    let client = TranslationClient::new(open_db(), transport.clone());

    let id = message_id(peer(PeerNamespace::User, 1), 404);
    client.translate_messages(&[id], "de").await.unwrap();
    assert!(transport.calls().await.is_empty());
}

#[tokio::test]
async fn hiding_translations_survives_remote_failure() {
    let db = open_db();
    let chat = peer(PeerNamespace::Channel, 3);
    let transport = ScriptedTransport::new();
    transport.push(Err(RpcError::network("connection refused"))).await;
    let client = TranslationClient::new(db.clone(), transport.clone());

    client.toggle_peer_translation_hidden(chat, true).await.unwrap();

    let data = db.transaction(|tx| tx.get_peer_cached_data(chat)).unwrap().unwrap();
    assert!(data.translations_hidden);
    assert_eq!(
        transport.calls().await,
        vec![RpcCall::TogglePeerTranslations { peer: chat, disabled: true }]
    );
}
