//! `knowledge_base_search`: queries the Vector Store directly for statute
//! excerpts, for when the Specialist wants cited text rather than a live
//! web search. Supplemental — not part of the mandatory catalog.

use std::sync::Arc;

use async_trait::async_trait;
use lawagent_core::{CoreError, Result};
use lawagent_llm::{EmbeddingClient, ToolSchema};
use lawagent_store::VectorStore;
use serde_json::{Value, json};
use tracing::warn;

use crate::tool::Tool;

const DEFAULT_TOP_K: usize = 5;

pub struct KnowledgeBaseSearchTool {
    vector_store: Arc<VectorStore>,
    embedding: Arc<EmbeddingClient>,
}

impl KnowledgeBaseSearchTool {
    pub fn new(vector_store: Arc<VectorStore>, embedding: Arc<EmbeddingClient>) -> Self {
        Self { vector_store, embedding }
    }
}

#[async_trait]
impl Tool for KnowledgeBaseSearchTool {
    fn name(&self) -> &str {
        "knowledge_base_search"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "knowledge_base_search",
            "Searches the indexed legal knowledge base for statute excerpts and prior archived case notes related to a query.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "top_k": {"type": "integer", "description": "default 5"}
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let params: Value = serde_json::from_str(arguments).unwrap_or(json!({}));
        let query = params
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::tool("knowledge_base_search", "missing required field `query`"))?;
        let top_k = params.get("top_k").and_then(|v| v.as_u64()).map(|v| v as usize).unwrap_or(DEFAULT_TOP_K);

        let embedding = self
            .embedding
            .encode(std::slice::from_ref(&query.to_string()))
            .await
            .map_err(|e| CoreError::tool("knowledge_base_search", format!("failed to embed query: {e}")))?
            .pop()
            .ok_or_else(|| CoreError::tool("knowledge_base_search", "embedding client returned no vector"))?;

        let hits = self
            .vector_store
            .search(&embedding, top_k, None)
            .await
            .map_err(|e| CoreError::tool("knowledge_base_search", format!("vector store search failed: {e}")))?;

        if hits.is_empty() {
            warn!("knowledge base search returned no hits");
            return Ok("知识库中未找到相关条文或案例。".to_string());
        }

        let rendered: Vec<String> = hits.iter().map(|h| format!("[{:.2}] {}", h.score, h.content)).collect();
        Ok(rendered.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawagent_llm::EmbeddingClientConfig;
    use lawagent_store::Database;

    fn tool() -> KnowledgeBaseSearchTool {
        let db = Database::open_in_memory().unwrap();
        let vector_store = Arc::new(VectorStore::new(db));
        vector_store.initialize("test", 3);
        let embedding = Arc::new(EmbeddingClient::new(EmbeddingClientConfig::new("http://x", "key", "m")).with_dimension(3));
        KnowledgeBaseSearchTool::new(vector_store, embedding)
    }

    #[test]
    fn name_is_knowledge_base_search() {
        assert_eq!(tool().name(), "knowledge_base_search");
    }

    #[test]
    fn schema_marks_query_as_required() {
        let schema = tool().schema();
        assert_eq!(schema.function.name, "knowledge_base_search");
        let required = schema.function.parameters["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "query"));
    }
}
