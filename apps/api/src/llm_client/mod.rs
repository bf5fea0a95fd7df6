/// Generation backend — the single point of entry for all model calls in Prism.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All guided generation MUST go through the `GenerationBackend` trait.
///
/// Guided generation is realized as a forced tool call: the compiled schema
/// graph becomes the tool's `input_schema`, so the API itself rejects
/// output that does not conform — the hard-constraint contract the
/// executor relies on. This service never retries malformed output; shape
/// enforcement is the backend's job.
///
/// Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all guided generation calls in Prism.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

/// Name of the forced tool carrying the compiled schema.
const STRUCTURED_TOOL: &str = "emit_structured_output";

/// A failure from the generation backend, propagated to the run that
/// triggered it. Retryability is a property of the kind, not the call
/// site — see [`GenerationError::is_retryable`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Backend overloaded after {retries} retries")]
    Overloaded { retries: u32 },

    #[error("Generation timed out")]
    Timeout,

    #[error("Model refused to produce structured output")]
    Refusal,

    #[error("Prompt exceeds the model context window")]
    ContextOverflow,

    #[error("Model returned no structured output")]
    EmptyOutput,
}

impl GenerationError {
    /// Whether a caller may reasonably retry the run. Transient transport
    /// and capacity failures are retryable; refusals and oversize prompts
    /// are not — retrying them reproduces the same outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Http(_)
                | GenerationError::RateLimited { .. }
                | GenerationError::Overloaded { .. }
                | GenerationError::Timeout
        )
    }
}

/// Whether the backend can serve a run right now. Checked by the
/// executor's caller before invoking `run`, never masked as a generic
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready,
    Unavailable(String),
}

/// A fresh generation session. One per run — sessions are never reused
/// across runs or plans, so instructions cannot bleed between unrelated
/// templates.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub instructions: String,
}

impl SessionSpec {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    /// The full system text for the session: template instructions plus
    /// the fixed structured-output preamble.
    pub fn system_text(&self) -> String {
        format!("{}\n\n{}", self.instructions, prompts::SESSION_PREAMBLE)
    }
}

/// The seam between the executor and the generative model.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Runs guided generation: `input` is the prompt, `schema` the hard
    /// output constraint. Returns the raw structured response.
    async fn generate(
        &self,
        session: &SessionSpec,
        input: &str,
        schema: &Value,
    ) -> Result<Value, GenerationError>;

    /// Readiness probe. Defaults to ready.
    fn availability(&self) -> Availability {
        Availability::Ready
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    tools: Vec<ToolSpec<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolSpec<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct BackendResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    input: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Guided-generation client for the Anthropic Messages API.
/// Wraps the API with retry logic and forced-tool structured output.
#[derive(Clone)]
pub struct AnthropicBackend {
    client: Client,
    api_key: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    /// Makes a guided generation call, retrying 429 / 529 / 5xx and
    /// transport timeouts with exponential backoff.
    async fn generate(
        &self,
        session: &SessionSpec,
        input: &str,
        schema: &Value,
    ) -> Result<Value, GenerationError> {
        let system = session.system_text();
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: &system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: input,
            }],
            tools: vec![ToolSpec {
                name: STRUCTURED_TOOL,
                description: prompts::STRUCTURED_TOOL_DESCRIPTION,
                input_schema: schema,
            }],
            tool_choice: ToolChoice {
                kind: "tool",
                name: STRUCTURED_TOOL,
            },
        };

        let mut last_error: Option<GenerationError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Generation attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    last_error = Some(GenerationError::Timeout);
                    continue;
                }
                Err(e) => {
                    last_error = Some(GenerationError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                warn!("Backend returned 429: {}", body);
                last_error = Some(GenerationError::RateLimited {
                    retries: MAX_RETRIES,
                });
                continue;
            }

            if status.as_u16() == 529 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Backend returned {}: {}", status, body);
                last_error = Some(GenerationError::Overloaded {
                    retries: MAX_RETRIES,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse error message
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                if message.contains("prompt is too long") {
                    return Err(GenerationError::ContextOverflow);
                }
                return Err(GenerationError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let backend_response: BackendResponse = response.json().await?;

            debug!(
                "Generation succeeded: input_tokens={}, output_tokens={}",
                backend_response.usage.input_tokens, backend_response.usage.output_tokens
            );

            return extract_structured(backend_response);
        }

        Err(last_error.unwrap_or(GenerationError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    fn availability(&self) -> Availability {
        if self.api_key.trim().is_empty() {
            Availability::Unavailable("ANTHROPIC_API_KEY is not set".to_string())
        } else {
            Availability::Ready
        }
    }
}

/// Pulls the forced tool call's input out of a successful response.
/// A response without one is a refusal (when the model said so) or empty
/// output — never silently defaulted.
fn extract_structured(response: BackendResponse) -> Result<Value, GenerationError> {
    let structured = response
        .content
        .into_iter()
        .find(|block| block.block_type == "tool_use")
        .and_then(|block| block.input);

    match structured {
        Some(value) => Ok(value),
        None if response.stop_reason.as_deref() == Some("refusal") => {
            Err(GenerationError::Refusal)
        }
        None => Err(GenerationError::EmptyOutput),
    }
}
