use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use spendlens_classify::WebLookup;
use spendlens_core::rules::CategoryRules;
use spendlens_storage::{Ledger, SqliteStore};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spendlens=info,tower_http=info")),
        )
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    let rules = CategoryRules::with_overrides(config.rules.clone()).context("Invalid category rules")?;

    let store = SqliteStore::open(&config.storage.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.storage.database_path.display()))?;
    let ledger = Ledger::new(store, rules)
        .with_weights(config.classifier)
        .with_transfer_detector(config.transfers.detector());

    // ── Ledger event log ──────────────────────────────────────────────────────
    let mut events = ledger.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(?event, "ledger changed");
        }
    });

    let lookup = WebLookup::new(
        Duration::from_secs(config.lookup.ddg_timeout_secs),
        Duration::from_secs(config.lookup.wiki_timeout_secs),
    )
    .context("Failed to build HTTP client")?;
    if config.lookup.enabled {
        tracing::info!("web lookups enabled");
    }

    let app = AppState::new(ledger, lookup, config.lookup.clone())
        .router()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, db = %config.storage.database_path.display(), "spendlens listening");
    axum::serve(listener, app).await?;
    Ok(())
}
