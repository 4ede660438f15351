mod mock;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::prompt::PromptData;
use crate::types::LlmReply;

pub use mock::MockLlmProvider;

/// The single operation the core consumes from an LLM provider adapter
/// (§6). Concrete adapters — request formatting, HTTP, auth — are out of
/// scope for the core; this trait is the seam they implement against.
///
/// # Contract
/// - Must be `Send + Sync` (used behind `Arc<dyn LlmProvider>`).
/// - Must honor `cancel`: if it fires mid-call, return promptly rather than
///   completing the request.
/// - Returns `Err(ProviderError)` only for genuine provider-level failures;
///   never panics.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &PromptData, cancel: CancellationToken) -> Result<LlmReply, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("transport error: {0}")]
    Transport(String),
}
