//! The mandatory tool catalog and the registry that dispatches it.

pub mod registry;
pub mod tool;
pub mod tools;

use std::sync::Arc;
use std::time::Duration;

use lawagent_core::Config;
use lawagent_llm::EmbeddingClient;
use lawagent_store::VectorStore;

pub use registry::{ToolRegistry, extract_primary_arg};
pub use tool::Tool;
pub use tools::{
    CalculatorTool, DatetimeTool, DocumentGeneratorTool, FileReadTool, KnowledgeBaseSearchTool, PythonExecutorTool,
    WebCrawlerTool, WebSearchTool, WeatherTool,
};

/// Builds a registry populated with the mandatory tool catalog:
/// `web_search`, `calculator`, `python_executor`, `file_read`, `datetime`,
/// `weather`, `web_crawler`, `document_generator`.
pub fn build_mandatory_catalog(config: &Config) -> ToolRegistry {
    let tool_timeout = Duration::from_secs(config.tool_http_timeout_secs);
    let mut registry = ToolRegistry::new(config.max_observe);

    registry.register(Arc::new(WebSearchTool::new(config.bocha_api_key.clone(), tool_timeout)));
    registry.register(Arc::new(CalculatorTool));
    registry.register(Arc::new(PythonExecutorTool::new(tool_timeout)));
    registry.register(Arc::new(FileReadTool::new(config.data_dir.clone())));
    registry.register(Arc::new(DatetimeTool));
    registry.register(Arc::new(WeatherTool::new(tool_timeout)));
    registry.register(Arc::new(WebCrawlerTool::new(tool_timeout)));
    registry.register(Arc::new(DocumentGeneratorTool::new(config.output_dir.clone())));

    registry
}

/// Adds the supplemental `knowledge_base_search` tool, which isn't part
/// of the mandatory catalog since it depends on storage/embedding
/// components the registry itself doesn't own.
pub fn register_knowledge_base_search(registry: &mut ToolRegistry, vector_store: Arc<VectorStore>, embedding: Arc<EmbeddingClient>) {
    registry.register(Arc::new(KnowledgeBaseSearchTool::new(vector_store, embedding)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_catalog_registers_every_named_tool() {
        let config = Config::default();
        let registry = build_mandatory_catalog(&config);
        for name in [
            "web_search",
            "calculator",
            "python_executor",
            "file_read",
            "datetime",
            "weather",
            "web_crawler",
            "document_generator",
        ] {
            assert!(registry.has(name), "missing mandatory tool `{name}`");
        }
    }
}
