use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_api::state::{AppState, AppStateInner};
use quill_engine::{ConsumptionTracker, SystemClock};
use quill_rpc::{AudioTranscriptionManager, HttpTransport, RpcConfig, TranscriptionClient, TranslationClient, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUILL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
    let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUILL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let rpc_config = RpcConfig::from_env();

    // Init database
    let db = Arc::new(quill_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&rpc_config));
    let transcriptions = Arc::new(AudioTranscriptionManager::new());
    let state: AppState = Arc::new(AppStateInner {
        consumption: ConsumptionTracker::new(db.clone(), Arc::new(SystemClock)),
        translation: TranslationClient::new(db.clone(), transport.clone()),
        transcription: TranscriptionClient::new(db, transport, transcriptions),
        jwt_secret,
    });

    let app = quill_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quill server listening on {} (upstream {})", addr, rpc_config.base_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
