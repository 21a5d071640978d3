//! Translation and transcription calls against the upstream service, and the
//! attribute commits that follow them.

pub mod config;
pub mod error;
pub mod transcription;
pub mod translation;
pub mod transport;

use std::sync::Arc;

use anyhow::Result;

use quill_db::{Database, Transaction};

pub use config::RpcConfig;
pub use error::{RpcError, TranslationError};
pub use transcription::{AudioTranscriptionManager, TranscriptionClient};
pub use translation::TranslationClient;
pub use transport::{HttpTransport, RpcCall, RpcResponse, Transport};

/// Runs `f` in a store transaction on the blocking pool.
pub(crate) async fn in_transaction<F, T>(db: &Arc<Database>, f: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || db.transaction(f)).await?
}
