//! Text and message translation.
//!
//! Two error regimes live side by side: [`TranslationClient::translate`] has no
//! error channel and reports every failure as `None`, while the structured and
//! per-message forms return a [`TranslationError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use quill_db::Database;
use quill_engine::applier::{self, MessageDelta};
use quill_types::attributes::TranslationAttribute;
use quill_types::models::Poll;
use quill_types::{Message, MessageAttribute, MessageId, PeerId, TextWithEntities};

use crate::error::TranslationError;
use crate::in_transaction;
use crate::transport::{RpcCall, RpcResponse, Transport};

pub struct TranslationClient {
    db: Arc<Database>,
    transport: Arc<dyn Transport>,
}

impl TranslationClient {
    pub fn new(db: Arc<Database>, transport: Arc<dyn Transport>) -> Self {
        Self { db, transport }
    }

    /// Translates a single plain text. Failures and "no result" both yield `None`.
    pub async fn translate(&self, text: &str, from_lang: Option<&str>, to_lang: &str) -> Option<String> {
        let call = RpcCall::TranslateText {
            peer: None,
            msg_ids: Vec::new(),
            text: Some(vec![TextWithEntities::plain(text)]),
            from_lang: from_lang.map(str::to_owned),
            to_lang: to_lang.to_owned(),
        };

        match self.transport.request(call).await {
            Ok(RpcResponse::TranslatedText { texts }) => texts.into_iter().next().map(|t| t.text),
            Ok(RpcResponse::TranslateNoResult) => None,
            Ok(other) => {
                warn!("Unexpected translate response: {:?}", other);
                None
            }
            Err(err) => {
                warn!("Translate failed: {}", err);
                None
            }
        }
    }

    /// Translates `texts` as one batch, preserving order and entities.
    pub async fn translate_structured(
        &self,
        texts: Vec<TextWithEntities>,
        to_lang: &str,
    ) -> Result<Vec<TextWithEntities>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();
        let call = RpcCall::TranslateText {
            peer: None,
            msg_ids: Vec::new(),
            text: Some(texts),
            from_lang: None,
            to_lang: to_lang.to_owned(),
        };
        self.request_texts(call, expected).await
    }

    /// Translates the given messages and stores a `Translation` attribute on each.
    ///
    /// Regular messages go out as one id-based request per peer. Each poll is
    /// sent as its own inline batch (question, options, then solution) and
    /// reassembled into a single attribute. Results are committed after every
    /// request, so an error leaves earlier batches translated.
    pub async fn translate_messages(
        &self,
        message_ids: &[MessageId],
        to_lang: &str,
    ) -> Result<(), TranslationError> {
        let ids = message_ids.to_vec();
        let messages = in_transaction(&self.db, move |tx| {
            let mut found = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(message) = tx.get_message(id)? {
                    found.push(message);
                }
            }
            Ok(found)
        })
        .await
        .map_err(storage_error)?;

        let mut by_peer: BTreeMap<PeerId, Vec<Message>> = BTreeMap::new();
        for message in messages {
            by_peer.entry(message.id.peer_id).or_default().push(message);
        }

        for (peer_id, messages) in by_peer {
            let (polls, regular): (Vec<Message>, Vec<Message>) =
                messages.into_iter().partition(|m| m.poll().is_some());

            if !regular.is_empty() {
                let call = RpcCall::TranslateText {
                    peer: Some(peer_id),
                    msg_ids: regular.iter().map(|m| m.id.id).collect(),
                    text: None,
                    from_lang: None,
                    to_lang: to_lang.to_owned(),
                };
                let texts = self.request_texts(call, regular.len()).await?;
                let batch = regular
                    .iter()
                    .zip(texts)
                    .map(|(message, text)| {
                        let attribute = TranslationAttribute {
                            text: text.text,
                            entities: text.entities,
                            to_lang: to_lang.to_owned(),
                            additional: Vec::new(),
                            poll_solution: None,
                        };
                        (message.id, attribute)
                    })
                    .collect();
                self.commit(batch).await?;
            }

            for message in &polls {
                let Some(poll) = message.poll() else {
                    continue;
                };
                let parts = flatten_poll(poll);
                let expected = parts.len();
                let call = RpcCall::TranslateText {
                    peer: None,
                    msg_ids: Vec::new(),
                    text: Some(parts),
                    from_lang: None,
                    to_lang: to_lang.to_owned(),
                };
                let texts = self.request_texts(call, expected).await?;
                let attribute = reassemble_poll(poll, texts, to_lang);
                self.commit(vec![(message.id, attribute)]).await?;
            }
        }

        Ok(())
    }

    /// Hides or shows the translation bar for `peer_id`. The local flag is
    /// always written; the server is told on a best-effort basis.
    pub async fn toggle_peer_translation_hidden(&self, peer_id: PeerId, hidden: bool) -> anyhow::Result<()> {
        in_transaction(&self.db, move |tx| {
            tx.update_peer_cached_data(&[peer_id], |_, current| {
                let mut data = current.unwrap_or_default();
                data.translations_hidden = hidden;
                Some(data)
            })
        })
        .await?;

        let call = RpcCall::TogglePeerTranslations {
            peer: peer_id,
            disabled: hidden,
        };
        if let Err(err) = self.transport.request(call).await {
            warn!("Failed to sync translation visibility for {}: {}", peer_id, err);
        }
        Ok(())
    }

    async fn request_texts(&self, call: RpcCall, expected: usize) -> Result<Vec<TextWithEntities>, TranslationError> {
        match self.transport.request(call).await? {
            RpcResponse::TranslatedText { texts } if texts.len() == expected => Ok(texts),
            RpcResponse::TranslatedText { texts } => {
                warn!("Translation returned {} texts, expected {}", texts.len(), expected);
                Err(TranslationError::Generic)
            }
            other => {
                warn!("Unexpected translate response: {:?}", other);
                Err(TranslationError::Generic)
            }
        }
    }

    async fn commit(&self, batch: Vec<(MessageId, TranslationAttribute)>) -> Result<(), TranslationError> {
        let count = batch.len();
        in_transaction(&self.db, move |tx| {
            for (id, attribute) in batch {
                let mut delta = MessageDelta::new();
                delta.replace(MessageAttribute::Translation(attribute));
                applier::apply(tx, id, &delta)?;
            }
            Ok(())
        })
        .await
        .map_err(storage_error)?;

        debug!("Stored {} translations", count);
        Ok(())
    }
}

fn storage_error(err: anyhow::Error) -> TranslationError {
    error!("Translation storage failure: {:#}", err);
    TranslationError::Generic
}

/// Question first, then every option, then the solution if the poll has one.
pub fn flatten_poll(poll: &Poll) -> Vec<TextWithEntities> {
    let mut parts = Vec::with_capacity(poll.options.len() + 2);
    parts.push(poll.question.clone());
    parts.extend(poll.options.iter().map(|option| option.text.clone()));
    if let Some(solution) = &poll.solution {
        parts.push(solution.clone());
    }
    parts
}

/// Inverse of [`flatten_poll`] over the translated parts.
pub fn reassemble_poll(poll: &Poll, texts: Vec<TextWithEntities>, to_lang: &str) -> TranslationAttribute {
    let mut texts = texts.into_iter();
    let question = texts.next().unwrap_or_default();
    let additional = texts.by_ref().take(poll.options.len()).collect();
    let poll_solution = if poll.solution.is_some() { texts.next() } else { None };

    TranslationAttribute {
        text: question.text,
        entities: question.entities,
        to_lang: to_lang.to_owned(),
        additional,
        poll_solution,
    }
}
