//! Execution — runs a compiled plan against input text.
//!
//! Flow: fresh session from plan.instructions → guided generation with the
//! schema as a hard constraint → decode into ordered output groups.
//!
//! The runner is stateless: nothing is retained between calls, and
//! concurrent runs for different plans/inputs share nothing but the
//! backend handle. Cancelling a run while the generation call is pending
//! drops it cleanly — the plan cache is never touched from here.

pub mod handlers;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::compiler::plan::{DecodeError, ExecutionPlan};
use crate::llm_client::{GenerationBackend, GenerationError, SessionSpec};
use crate::models::output::OutputGroup;

/// A failed run: either the backend failed to generate, or its response
/// did not match the compiled shape.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("response decoding failed: {0}")]
    Decode(#[from] DecodeError),
}

impl RunError {
    /// Decode failures are never retryable — the plan and response are
    /// both deterministic. Generation failures delegate to their kind.
    pub fn is_retryable(&self) -> bool {
        match self {
            RunError::Generation(e) => e.is_retryable(),
            RunError::Decode(_) => false,
        }
    }
}

/// Stateless executor over a generation backend.
#[derive(Clone)]
pub struct Runner {
    backend: Arc<dyn GenerationBackend>,
}

impl Runner {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Runs one plan against one input.
    ///
    /// Each run opens a fresh session scoped to the plan's instructions —
    /// sessions are never reused across runs or plans, so instructions
    /// cannot bleed between unrelated templates.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        input: &str,
    ) -> Result<Vec<OutputGroup>, RunError> {
        let session = SessionSpec::new(plan.instructions.clone());
        let schema = plan.schema_json();

        let response = self.backend.generate(&session, input, &schema).await?;
        let groups = plan.decode(&response)?;

        info!(
            template_id = %plan.template_id,
            version = plan.version,
            groups = groups.len(),
            "run decoded"
        );
        Ok(groups)
    }
}
