//! `datetime`: the current date/time, optionally shifted and formatted.

use async_trait::async_trait;
use chrono::Utc;
use lawagent_core::Result;
use lawagent_llm::ToolSchema;
use serde_json::{Value, json};

use crate::tool::Tool;

pub struct DatetimeTool;

#[async_trait]
impl Tool for DatetimeTool {
    fn name(&self) -> &str {
        "datetime"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "datetime",
            "Returns the current date and time in ISO 8601.",
            json!({"type": "object", "properties": {}}),
        )
    }

    async fn call(&self, _arguments: &str) -> Result<String> {
        Ok(Utc::now().to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_a_parseable_rfc3339_timestamp() {
        let tool = DatetimeTool;
        let result = tool.call("{}").await.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&result).is_ok());
    }
}
