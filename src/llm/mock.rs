use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::llm::{LlmProvider, ProviderError};
use crate::prompt::PromptData;
use crate::types::LlmReply;
use async_trait::async_trait;

/// Scripted test double: returns the next queued reply on each call and
/// records every call for assertions (call count, prompt snapshot seen).
pub struct MockLlmProvider {
    replies: Mutex<Vec<LlmReply>>,
    call_log: Mutex<Vec<PromptData>>,
}

impl MockLlmProvider {
    pub fn new(replies: Vec<LlmReply>) -> Self {
        Self { replies: Mutex::new(replies), call_log: Mutex::new(Vec::new()) }
    }

    pub async fn call_count(&self) -> usize {
        self.call_log.lock().await.len()
    }

    pub async fn prompt_for_call(&self, n: usize) -> Option<PromptData> {
        self.call_log.lock().await.get(n).cloned()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, prompt: &PromptData, _cancel: CancellationToken) -> Result<LlmReply, ProviderError> {
        self.call_log.lock().await.push(prompt.clone());

        let mut replies = self.replies.lock().await;
        if replies.is_empty() {
            return Err(ProviderError::Transport("MockLlmProvider: no more programmed replies".to_string()));
        }
        Ok(replies.remove(0))
    }
}
