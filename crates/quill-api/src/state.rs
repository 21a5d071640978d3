use std::sync::Arc;

use quill_engine::ConsumptionTracker;
use quill_rpc::{TranscriptionClient, TranslationClient};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub consumption: ConsumptionTracker,
    pub translation: TranslationClient,
    pub transcription: TranscriptionClient,
    pub jwt_secret: String,
}
