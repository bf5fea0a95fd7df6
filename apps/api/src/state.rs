use std::sync::Arc;

use crate::compiler::cache::PlanCache;
use crate::config::Config;
use crate::execution::Runner;
use crate::llm_client::GenerationBackend;
use crate::template::store::TemplateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// In-memory template registry (stand-in for the external persistence
    /// collaborator).
    pub templates: Arc<TemplateStore>,
    /// Plan cache — the only shared mutable state in the core.
    pub plans: Arc<PlanCache>,
    /// Pluggable generation backend. Default: AnthropicBackend.
    pub backend: Arc<dyn GenerationBackend>,
    /// Stateless executor over the backend.
    pub runner: Runner,
    pub config: Config,
}
