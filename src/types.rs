use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ArgMap = HashMap<String, serde_json::Value>;

/// A category a registered tool belongs to. Drives dependency inference in
/// the Planner and the Reflection Evaluator's summary, not execution itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepCategory {
    Analysis,
    Modification,
    Test,
    Execution,
    Completion,
    Other,
}

impl std::fmt::Display for StepCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            StepCategory::Analysis => "analysis",
            StepCategory::Modification => "modification",
            StepCategory::Test => "test",
            StepCategory::Execution => "execution",
            StepCategory::Completion => "completion",
            StepCategory::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A model-requested call to a named tool. `id` correlates the eventual
/// tool-response `Message` back to the assistant message that requested it;
/// the core synthesizes one when a provider adapter omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub args: ArgMap,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: ArgMap) -> Self {
        Self { id: id.into(), name: name.into(), args }
    }
}

/// Catalogue entry describing a registered tool to the model and to the
/// Planner's categorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub schema: Option<serde_json::Value>,
    pub category: StepCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One turn of the conversation exchanged with the model.
///
/// Invariant: a `Role::Tool` message must carry `tool_call_id` and follow an
/// assistant message whose `tool_calls` contained that id; the first message
/// of a conversation is always the system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub tool_call_id: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_call_id: None, tool_calls: Vec::new() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_call_id: None, tool_calls: Vec::new() }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// What a `LlmProvider::generate` call returns on success.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmReply {
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl LlmReply {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
