//! Wire-level chat message and tool-call types.
//!
//! Shaped after the OpenAI-compatible chat-completions contract:
//! `content` is flat text, tool calls live in `tool_calls` on assistant
//! messages, and `tool`-role messages carry a `tool_call_id` correlating
//! them back to the call that produced them.

use serde::{Deserialize, Serialize};

/// The role of a single chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_call_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

/// The `function` payload inside a [`ToolCall`]: a name plus a JSON-encoded
/// argument string (not a parsed value — the callee parses it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Drop tool-role messages whose preceding assistant-with-tool_calls
/// message (matching their `tool_call_id`) is not present in the window.
///
/// Required before every LLM send: most providers reject a `tool` message
/// whose originating `tool_calls` entry isn't in the same request.
pub fn prune_orphan_tool_messages(messages: &[Message]) -> Vec<Message> {
    let mut known_ids = std::collections::HashSet::new();
    for m in messages {
        if m.role == Role::Assistant {
            if let Some(calls) = &m.tool_calls {
                for c in calls {
                    known_ids.insert(c.id.clone());
                }
            }
        }
    }

    messages
        .iter()
        .filter(|m| {
            if m.role != Role::Tool {
                return true;
            }
            m.tool_call_id
                .as_ref()
                .is_some_and(|id| known_ids.contains(id))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trips_through_json_for_every_role() {
        let tool_call = ToolCall {
            id: "call_1".into(),
            kind: "function".into(),
            function: FunctionCall {
                name: "web_search".into(),
                arguments: "{\"query\":\"x\"}".into(),
            },
        };
        let msgs = vec![
            Message::system("sys"),
            Message::user("hi"),
            Message::assistant_with_tool_calls("", vec![tool_call]),
            Message::tool("result", "call_1", "web_search"),
        ];
        for m in msgs {
            let json = serde_json::to_string(&m).unwrap();
            let back: Message = serde_json::from_str(&json).unwrap();
            assert_eq!(m, back);
        }
    }

    #[test]
    fn orphan_tool_message_is_dropped() {
        let messages = vec![
            Message::user("hi"),
            Message::tool("orphaned", "call_missing", "web_search"),
        ];
        let pruned = prune_orphan_tool_messages(&messages);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].role, Role::User);
    }

    #[test]
    fn tool_message_with_matching_assistant_call_survives() {
        let tool_call = ToolCall {
            id: "call_9".into(),
            kind: "function".into(),
            function: FunctionCall {
                name: "calculator".into(),
                arguments: "{}".into(),
            },
        };
        let messages = vec![
            Message::user("compute"),
            Message::assistant_with_tool_calls("", vec![tool_call]),
            Message::tool("42", "call_9", "calculator"),
        ];
        let pruned = prune_orphan_tool_messages(&messages);
        assert_eq!(pruned.len(), 3);
    }
}
