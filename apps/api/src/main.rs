mod compiler;
mod config;
mod errors;
mod execution;
mod llm_client;
mod models;
mod routes;
mod state;
mod template;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compiler::cache::PlanCache;
use crate::config::Config;
use crate::execution::Runner;
use crate::llm_client::{AnthropicBackend, GenerationBackend};
use crate::routes::build_router;
use crate::state::AppState;
use crate::template::store::TemplateStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prism API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the generation backend
    let backend: Arc<dyn GenerationBackend> =
        Arc::new(AnthropicBackend::new(config.anthropic_api_key.clone()));
    info!("Generation backend initialized (model: {})", llm_client::MODEL);

    // Initialize the template registry and plan cache
    let templates = Arc::new(TemplateStore::new());
    let plans = Arc::new(PlanCache::new());

    // Initialize the executor
    let runner = Runner::new(Arc::clone(&backend));

    // Build app state
    let state = AppState {
        templates,
        plans,
        backend,
        runner,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
