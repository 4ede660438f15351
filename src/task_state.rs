use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::types::ArgMap;

#[derive(Debug, Default)]
struct Inner {
    tool_use_counts: HashMap<String, usize>,
    last_tool_error: HashMap<String, String>,
    files_created: HashSet<String>,
    files_modified: HashSet<String>,
    files_read: HashSet<String>,
    commands_executed: Vec<String>,
    errors: Vec<String>,
    acknowledged_errors: usize,
    last_tool_result: Option<String>,
    context: ArgMap,
}

/// Process-wide record of what the agent has done and observed so far:
/// tool usage counts, file touches, commands run, outstanding errors, and a
/// free-form context map used for cross-component signaling (the
/// `has_decomposed_task` / `task_completed` flags in particular).
///
/// Guarded by a single `tokio::sync::RwLock`; no operation here ever calls
/// back into the [`crate::tools::ToolRegistry`] (that would allow recursion
/// through tool execution). Held behind `Arc` and injected wherever it is
/// needed rather than reached for as a global/static (see DESIGN.md).
#[derive(Debug, Default)]
pub struct TaskState {
    inner: RwLock<Inner>,
}

impl TaskState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_tool_use(&self, name: &str, success: bool) {
        let mut inner = self.inner.write().await;
        *inner.tool_use_counts.entry(name.to_string()).or_insert(0) += 1;
        if success {
            inner.last_tool_error.remove(name);
        }
    }

    pub async fn tool_use_count(&self, name: &str) -> usize {
        self.inner.read().await.tool_use_counts.get(name).copied().unwrap_or(0)
    }

    /// No-op if `path` was already recorded — file-set operations are
    /// idempotent by construction (`HashSet::insert`).
    pub async fn record_file_created(&self, path: impl Into<String>) {
        self.inner.write().await.files_created.insert(path.into());
    }

    pub async fn record_file_modified(&self, path: impl Into<String>) {
        self.inner.write().await.files_modified.insert(path.into());
    }

    pub async fn record_file_read(&self, path: impl Into<String>) {
        self.inner.write().await.files_read.insert(path.into());
    }

    pub async fn record_command_executed(&self, command: impl Into<String>) {
        self.inner.write().await.commands_executed.push(command.into());
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        self.inner.write().await.errors.push(message.into());
    }

    /// True iff an error has been recorded since the last [`Self::acknowledge_errors`]
    /// call. The completion tool's implementation is expected to check this
    /// before reporting success (§7 recovery policy).
    pub async fn has_unresolved_errors(&self) -> bool {
        let inner = self.inner.read().await;
        inner.errors.len() > inner.acknowledged_errors
    }

    /// Marks all errors recorded so far as resolved, e.g. after a
    /// successful write that supersedes a prior failure.
    pub async fn acknowledge_errors(&self) {
        let mut inner = self.inner.write().await;
        inner.acknowledged_errors = inner.errors.len();
    }

    pub async fn errors(&self) -> Vec<String> {
        self.inner.read().await.errors.clone()
    }

    pub async fn set_last_tool_result(&self, result: impl Into<String>) {
        self.inner.write().await.last_tool_result = Some(result.into());
    }

    pub async fn last_tool_result(&self) -> Option<String> {
        self.inner.read().await.last_tool_result.clone()
    }

    pub async fn set_context(&self, key: impl Into<String>, value: serde_json::Value) {
        self.inner.write().await.context.insert(key.into(), value);
    }

    pub async fn get_context(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.read().await.context.get(key).cloned()
    }

    pub async fn files_created(&self) -> HashSet<String> {
        self.inner.read().await.files_created.clone()
    }

    pub async fn files_modified(&self) -> HashSet<String> {
        self.inner.read().await.files_modified.clone()
    }

    pub async fn files_read(&self) -> HashSet<String> {
        self.inner.read().await.files_read.clone()
    }

    pub async fn commands_executed(&self) -> Vec<String> {
        self.inner.read().await.commands_executed.clone()
    }

    /// Clears every recorded fact. Intended for reuse between independent
    /// tasks in a long-lived process, not for crash recovery (the core does
    /// not persist across restarts).
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_set_operations_are_idempotent() {
        let state = TaskState::new();
        state.record_file_modified("a.go").await;
        state.record_file_modified("a.go").await;
        assert_eq!(state.files_modified().await.len(), 1);
    }

    #[tokio::test]
    async fn unresolved_errors_clear_on_acknowledgement() {
        let state = TaskState::new();
        assert!(!state.has_unresolved_errors().await);
        state.record_error("write failed").await;
        assert!(state.has_unresolved_errors().await);
        state.acknowledge_errors().await;
        assert!(!state.has_unresolved_errors().await);
    }
}
