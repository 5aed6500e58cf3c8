//! Composition root: turns a loaded [`Config`] into a ready-to-run
//! [`Flow`], wiring storage, the tool registry, and the agent pool.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use lawagent_agent::{RouterAgent, SpecialistAgent, SpecialistConfig, ToolCallAgentConfig};
use lawagent_core::{Config, LegalDomain};
use lawagent_flow::{Flow, MemoryManager, MemoryManagerConfig};
use lawagent_llm::{EmbeddingClient, EmbeddingClientConfig, LlmClient, LlmClientConfig};
use lawagent_store::{Database, SessionStore, VectorStore};
use lawagent_tools::ToolRegistry;
use tracing::info;

pub async fn build_flow(config: &Config) -> Result<Flow> {
    std::fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;
    std::fs::create_dir_all(&config.output_dir).context("failed to create output directory")?;

    let db_path = std::path::Path::new(&config.data_dir).join("lawagent.db");
    let db = Database::open_and_migrate(db_path).await.context("failed to open database")?;
    info!("database ready");

    let llm = Arc::new(LlmClient::new(LlmClientConfig {
        base_url: config.llm_base_url.clone(),
        api_key: config.llm_api_key.clone(),
        model: "gpt-4o-mini".to_string(),
        max_retries: config.max_retries,
        timeout: std::time::Duration::from_secs(config.llm_timeout_secs),
    }));

    let embedding = Arc::new(EmbeddingClient::new(EmbeddingClientConfig {
        base_url: config.embedding_base_url.clone(),
        api_key: config.embedding_api_key.clone(),
        model: "text-embedding-3-small".to_string(),
        max_retries: config.max_retries,
        timeout: std::time::Duration::from_secs(config.embedding_timeout_secs),
    }));

    let session_store = Arc::new(SessionStore::new(db.clone()));
    let vector_store = Arc::new(VectorStore::new(db));
    let dim = embedding
        .encode(&["__dimension_probe__".to_string()])
        .await
        .map(|v| v.first().map(|e| e.len()).unwrap_or(1536))
        .unwrap_or(1536);
    vector_store.initialize(config.vector_db_collection.clone(), dim);
    info!(dim, "vector store initialized");

    let memory = Arc::new(MemoryManager::new(
        session_store,
        vector_store.clone(),
        embedding.clone(),
        MemoryManagerConfig {
            session_memory_size: config.session_memory_size,
            context_window_size: config.context_window_size,
            context_refine_threshold: config.context_refine_threshold,
            vector_top_k: 5,
        },
    ));

    let mut tool_registry = lawagent_tools::build_mandatory_catalog(config);
    lawagent_tools::register_knowledge_base_search(&mut tool_registry, vector_store, embedding);
    let tools = Arc::new(tool_registry);
    let router = Arc::new(RouterAgent::new(llm.clone()));

    let specialists = build_specialist_pool(llm, tools, config);

    Ok(Flow::new(memory, router, specialists))
}

fn build_specialist_pool(llm: Arc<LlmClient>, tools: Arc<ToolRegistry>, config: &Config) -> HashMap<LegalDomain, Arc<SpecialistAgent>> {
    let agent_config = ToolCallAgentConfig {
        temperature: Some(0.2),
        max_tokens: Some(2048),
        duplicate_threshold: config.duplicate_threshold,
    };
    let specialist_config = SpecialistConfig {
        max_critic_rounds: config.max_critic_rounds,
    };

    LegalDomain::ALL
        .into_iter()
        .map(|domain| {
            let specialist = SpecialistAgent::new(domain, llm.clone(), tools.clone(), agent_config.clone(), specialist_config.clone());
            (domain, Arc::new(specialist))
        })
        .collect()
}
