use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::AgentError;
use crate::task_state::TaskState;
use crate::types::{ArgMap, StepCategory, ToolDefinition};

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<String, String>> + Send>>;

/// A registered tool implementation. Takes an owned args map (so the
/// returned future does not borrow from the registry) and resolves to the
/// tool's own success/failure string, never a panic.
pub type ToolFn = Arc<dyn Fn(ArgMap) -> ToolFuture + Send + Sync>;

/// Required argument keys for a fixed set of well-known tool names, checked
/// by the Registry before dispatch (§4.A).
const REQUIRED_ARGS: &[(&str, &[&str])] = &[
    ("read_file", &["path"]),
    ("write_file", &["path"]),
    ("make_dir", &["path"]),
    ("mkdir", &["path"]),
];

struct ToolEntry {
    definition: ToolDefinition,
    func: ToolFn,
}

/// Name → function lookup, write-once at process start. Reads are
/// lock-free: the registry is built through [`ToolRegistryBuilder`] and then
/// frozen behind an `Arc`, never mutated again.
pub struct ToolRegistry {
    tools: HashMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|e| e.definition.clone()).collect()
    }

    /// The category registered for `name`, or [`StepCategory::Other`] if the
    /// tool is unregistered (ad-hoc tool names are categorized by the
    /// Planner's name-based heuristic instead).
    pub fn category_of(&self, name: &str) -> Option<StepCategory> {
        self.tools.get(name).map(|e| e.definition.category)
    }

    fn validate(&self, name: &str, args: &ArgMap) -> Result<(), AgentError> {
        if let Some((_, required)) = REQUIRED_ARGS.iter().find(|(n, _)| *n == name) {
            for key in *required {
                if !args.contains_key(*key) {
                    return Err(AgentError::InvalidArgs {
                        tool: name.to_string(),
                        reason: format!("missing required argument '{key}'"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Execute a named tool, recording the outcome in `task_state`. Never
    /// panics; registry-level failures (`ToolNotFound`, `InvalidArgs`) are
    /// returned before the tool function is ever invoked.
    pub async fn execute(
        &self,
        name: &str,
        args: &ArgMap,
        task_state: &TaskState,
    ) -> Result<String, AgentError> {
        self.validate(name, args)?;

        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        let result = (entry.func)(args.clone()).await;
        match result {
            Ok(output) => {
                task_state.record_tool_use(name, true).await;
                task_state.set_last_tool_result(output.clone()).await;
                Ok(output)
            }
            Err(reason) => {
                task_state.record_tool_use(name, false).await;
                task_state.record_error(format!("{name}: {reason}")).await;
                Err(AgentError::ToolError(name.to_string(), reason))
            }
        }
    }
}

/// Collects tool registrations before the registry is frozen into an
/// immutable, lock-free lookup table.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: HashMap<String, ToolEntry>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        category: StepCategory,
        schema: Option<serde_json::Value>,
        func: ToolFn,
    ) -> Self {
        let name = name.into();
        self.tools.insert(
            name.clone(),
            ToolEntry {
                definition: ToolDefinition { name, description: description.into(), schema, category },
                func,
            },
        );
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}

/// Wraps a plain synchronous closure as a [`ToolFn`] for tests and simple
/// tools that do no I/O of their own.
pub fn sync_tool<F>(f: F) -> ToolFn
where
    F: Fn(ArgMap) -> Result<String, String> + Send + Sync + 'static,
{
    Arc::new(move |args| {
        let result = f(args);
        Box::pin(async move { result })
    })
}
