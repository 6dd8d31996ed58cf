mod analysis;
mod candidates;
mod config;
mod db;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod routes;
mod settings;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::sessions::SessionRegistry;
use crate::candidates::{CandidateRepository, MemoryCandidateRepository, PgCandidateRepository};
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::HttpProviderClient;
use crate::routes::build_router;
use crate::settings::store::{MemorySettingsStore, PgSettingsStore, SettingsStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResuMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence: PostgreSQL when configured, in-memory otherwise
    let (settings, candidates): (Arc<dyn SettingsStore>, Arc<dyn CandidateRepository>) =
        match &config.database_url {
            Some(url) => {
                let db = create_pool(url).await?;
                ensure_schema(&db).await?;
                (
                    Arc::new(PgSettingsStore::new(db.clone())),
                    Arc::new(PgCandidateRepository::new(db)),
                )
            }
            None => {
                warn!("DATABASE_URL not set; settings and candidates will not survive a restart");
                (
                    Arc::new(MemorySettingsStore::default()),
                    Arc::new(MemoryCandidateRepository::default()),
                )
            }
        };

    let provider = Arc::new(HttpProviderClient::new()?);
    info!(
        default_provider = %config.ai_provider,
        timeout_secs = config.analysis_timeout.as_secs(),
        "provider client initialized"
    );

    let state = AppState {
        provider,
        settings,
        candidates,
        sessions: SessionRegistry::new(config.session_ttl, config.max_sessions),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
