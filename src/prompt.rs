use std::collections::HashSet;

use crate::types::{Message, Role, ToolDefinition, ToolInvocation};

/// {system prompt, ordered messages, available tool definitions} — owned
/// exclusively by the [`crate::engine::AgentLoop`] and mutated only through
/// append/compaction operations (§3).
#[derive(Debug, Clone)]
pub struct PromptData {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

impl PromptData {
    pub fn new(system_prompt: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self { messages: vec![Message::system(system_prompt)], tools }
    }

    /// Builder-style helper: push one more message and return self. Used by
    /// call sites (e.g. the decomposer) that build a one-off prompt inline.
    pub fn with_pushed(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>, tool_calls: Vec<ToolInvocation>) {
        self.messages.push(Message::assistant(content, tool_calls));
    }

    /// Appends a tool-response message. Content is formatted as
    /// `"Result of <tool>: <text>"` so that [`Self::compact`] can later
    /// recover which tools ran from the trimmed range.
    pub fn push_tool_result(&mut self, invocation: &ToolInvocation, text: impl Into<String>) {
        let content = format!("Result of {}: {}", invocation.name, text.into());
        self.messages.push(Message::tool_result(invocation.id.clone(), content));
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// History compaction (§4.G.2): keep the first message (system prompt)
    /// and the most recent half of the rest; synthesize a short system-role
    /// summary from the trimmed range and insert it as the second message.
    /// Never increases message count; always preserves the first message.
    pub fn compact(&mut self) {
        if self.messages.len() < 3 {
            return;
        }

        let system = self.messages[0].clone();
        let rest = &self.messages[1..];
        let keep_from = rest.len() / 2;
        let trimmed = &rest[..keep_from];
        let kept = rest[keep_from..].to_vec();

        let summary = synthesize_summary(trimmed);

        let mut compacted = vec![system];
        if let Some(summary) = summary {
            compacted.push(Message::system(summary));
        }
        compacted.extend(kept);
        self.messages = compacted;
    }
}

fn synthesize_summary(trimmed: &[Message]) -> Option<String> {
    let mut tool_names: Vec<String> = Vec::new();
    let mut seen_tools: HashSet<String> = HashSet::new();
    let mut paths: Vec<String> = Vec::new();
    let mut seen_paths: HashSet<String> = HashSet::new();

    for message in trimmed {
        if message.role == Role::Tool {
            if let Some(name) = extract_result_of_tool_name(&message.content) {
                if seen_tools.insert(name.clone()) {
                    tool_names.push(name);
                }
            }
        }
        if message.role == Role::Assistant {
            for call in &message.tool_calls {
                let is_write = call.name.to_ascii_lowercase().contains("write")
                    || call.name.to_ascii_lowercase().contains("edit")
                    || call.name.to_ascii_lowercase().contains("create");
                if !is_write {
                    continue;
                }
                for key in ["path", "file", "fileName", "file_path", "target"] {
                    if let Some(path) = call.args.get(key).and_then(|v| v.as_str()) {
                        if seen_paths.insert(path.to_string()) {
                            paths.push(path.to_string());
                        }
                    }
                }
            }
        }
    }

    if tool_names.is_empty() && paths.is_empty() {
        return None;
    }

    let mut summary = String::from("Earlier in this conversation: ");
    if !tool_names.is_empty() {
        summary.push_str(&format!("used tools [{}]", tool_names.join(", ")));
    }
    if !paths.is_empty() {
        if !tool_names.is_empty() {
            summary.push_str("; ");
        }
        summary.push_str(&format!("modified files [{}]", paths.join(", ")));
    }
    summary.push('.');
    Some(summary)
}

fn extract_result_of_tool_name(content: &str) -> Option<String> {
    let rest = content.strip_prefix("Result of ")?;
    let name = rest.split(':').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolInvocation;

    #[test]
    fn compaction_is_a_no_op_below_three_messages() {
        let mut prompt = PromptData::new("system", Vec::new());
        prompt.push_user("hi");
        let before = prompt.message_count();
        prompt.compact();
        assert_eq!(prompt.message_count(), before);
    }

    #[test]
    fn compaction_preserves_the_first_message_and_never_grows() {
        let mut prompt = PromptData::new("system prompt", Vec::new());
        for i in 0..10 {
            prompt.push_user(format!("message {i}"));
        }
        let before = prompt.message_count();
        let first_before = prompt.messages[0].content.clone();

        prompt.compact();

        assert_eq!(prompt.messages[0].content, first_before);
        assert!(prompt.message_count() <= before);
    }

    #[test]
    fn compaction_summary_names_tools_and_files() {
        let mut prompt = PromptData::new("system", Vec::new());
        for i in 0..6 {
            prompt.push_user(format!("do step {i}"));
            let inv = ToolInvocation::new(format!("c{i}"), "write_file", {
                let mut m = std::collections::HashMap::new();
                m.insert("path".to_string(), serde_json::json!("src/lib.rs"));
                m
            });
            prompt.push_assistant("", vec![inv.clone()]);
            prompt.push_tool_result(&inv, "wrote 10 bytes");
        }

        prompt.compact();

        let summary = &prompt.messages[1].content;
        assert!(summary.contains("write_file"));
        assert!(summary.contains("src/lib.rs"));
    }
}
