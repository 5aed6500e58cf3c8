//! Tool Registry: holds tool objects, exposes the JSON-schema list the
//! LLM sees, and dispatches named calls with observation-length capping.

use std::collections::HashMap;
use std::sync::Arc;

use lawagent_core::Result;
use lawagent_llm::ToolSchema;
use tracing::{debug, warn};

use crate::tool::Tool;

/// Keys probed, in order, to extract a best-effort primary argument from a
/// tool call's JSON object when a tool's own parsing wants a single value.
const PRIMARY_ARG_KEYS: &[&str] = &["query", "url", "city", "code", "expression", "file_path", "input", "user_input"];

const TRUNCATION_MARKER: &str = "\n...[truncated]";

#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    max_observe: usize,
}

impl ToolRegistry {
    pub fn new(max_observe: usize) -> Self {
        Self {
            tools: HashMap::new(),
            max_observe,
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Invoke a registered tool by name, capping the resulting observation
    /// at `max_observe` characters.
    pub async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| lawagent_core::CoreError::tool(name, "unknown tool"))?;

        debug!(tool = name, arguments, "invoking tool");
        let observation = tool.call(arguments).await?;
        Ok(cap_observation(&observation, self.max_observe))
    }
}

/// Best-effort single-value extraction from a JSON-object argument string,
/// probing [`PRIMARY_ARG_KEYS`] in order and falling back to the stringified
/// map when no key matches.
pub fn extract_primary_arg(arguments: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(arguments) else {
        return arguments.to_string();
    };

    let Some(map) = value.as_object() else {
        return arguments.to_string();
    };

    for key in PRIMARY_ARG_KEYS {
        if let Some(v) = map.get(*key) {
            if let Some(s) = v.as_str() {
                return s.to_string();
            }
            return v.to_string();
        }
    }

    warn!(arguments, "no primary argument key matched, falling back to raw map");
    arguments.to_string()
}

fn cap_observation(observation: &str, max_observe: usize) -> String {
    if observation.chars().count() <= max_observe {
        return observation.to_string();
    }
    let truncated: String = observation.chars().take(max_observe).collect();
    format!("{truncated}{TRUNCATION_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("echo", "echoes input", serde_json::json!({"type": "object"}))
        }

        async fn call(&self, arguments: &str) -> Result<String> {
            Ok(arguments.to_string())
        }
    }

    #[test]
    fn extract_primary_arg_prefers_query_over_other_keys() {
        let args = r#"{"query": "裁员赔偿", "max_results": 5}"#;
        assert_eq!(extract_primary_arg(args), "裁员赔偿");
    }

    #[test]
    fn extract_primary_arg_falls_back_to_raw_when_no_key_matches() {
        let args = r#"{"foo": "bar"}"#;
        assert_eq!(extract_primary_arg(args), args);
    }

    #[test]
    fn extract_primary_arg_handles_non_string_values() {
        let args = r#"{"code": 42}"#;
        assert_eq!(extract_primary_arg(args), "42");
    }

    #[test]
    fn cap_observation_leaves_short_strings_untouched() {
        assert_eq!(cap_observation("short", 100), "short");
    }

    #[test]
    fn cap_observation_truncates_and_marks_long_strings() {
        let long = "a".repeat(10);
        let capped = cap_observation(&long, 5);
        assert!(capped.starts_with("aaaaa"));
        assert!(capped.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn call_unknown_tool_returns_tool_error() {
        let registry = ToolRegistry::new(2000);
        let result = registry.call("nope", "{}").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn call_known_tool_caps_observation() {
        let mut registry = ToolRegistry::new(3);
        registry.register(Arc::new(EchoTool));
        let result = registry.call("echo", "abcdefgh").await.unwrap();
        assert!(result.starts_with("abc"));
        assert!(result.ends_with(TRUNCATION_MARKER));
    }
}
