//! The `Tool` trait every catalog entry implements.

use async_trait::async_trait;
use lawagent_core::Result;
use lawagent_llm::ToolSchema;

/// A single callable tool. Arguments arrive as a raw JSON string from the
/// LLM's tool call and the result is a string observation fed back to it.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    async fn call(&self, arguments: &str) -> Result<String>;
}
