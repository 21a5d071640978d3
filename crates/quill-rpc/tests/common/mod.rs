#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use quill_db::Database;
use quill_rpc::{RpcCall, RpcError, RpcResponse, Transport};
use quill_types::ids::namespaces;
use quill_types::models::Peer;
use quill_types::{AttributeSet, Media, Message, MessageAttribute, MessageId, PeerId, PeerNamespace, StoreMessage};

/// Replays queued responses in order and records every call it receives.
/// An empty queue answers with a generic error.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<RpcResponse, RpcError>>>,
    calls: Mutex<Vec<RpcCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push(&self, response: Result<RpcResponse, RpcError>) {
        self.responses.lock().await.push_back(response);
    }

    pub async fn calls(&self) -> Vec<RpcCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, call: RpcCall) -> Result<RpcResponse, RpcError> {
        self.calls.lock().await.push(call);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::new(500, "INTERNAL")))
    }
}

pub fn peer(namespace: PeerNamespace, id: i64) -> PeerId {
    PeerId::new(namespace, id)
}

pub fn message_id(peer_id: PeerId, id: i32) -> MessageId {
    MessageId::new(peer_id, namespaces::CLOUD, id)
}

pub fn open_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().unwrap())
}

pub fn put_peer(db: &Database, peer_id: PeerId) {
    db.transaction(|tx| {
        tx.put_peer(&Peer {
            id: peer_id,
            title: format!("peer {}", peer_id.id),
        })
    })
    .unwrap();
}

pub fn put_message(db: &Database, id: MessageId, attributes: Vec<MessageAttribute>, media: Vec<Media>) {
    let message = StoreMessage {
        id,
        globally_unique_id: None,
        timestamp: 1_700_000_000,
        incoming: true,
        tags: BTreeSet::new(),
        forward_info: None,
        author_id: Some(id.peer_id),
        text: format!("message {}", id.id),
        attributes: AttributeSet::from(attributes),
        media,
    };
    db.transaction(|tx| tx.store_message(&message)).unwrap();
}

pub fn get_message(db: &Database, id: MessageId) -> Message {
    db.transaction(|tx| tx.get_message(id)).unwrap().unwrap()
}
