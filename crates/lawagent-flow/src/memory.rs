//! Composes Session Memory, Global State, and the Vector Store behind a
//! single `get_full_context`/`check_and_archive` surface. Flow is the
//! only caller; agents receive context as a value and never hold a
//! reference into this struct.

use std::collections::HashMap;
use std::sync::Mutex;

use lawagent_core::{LegalDomain, LegalIntent, Message, Result};
use lawagent_llm::EmbeddingClient;
use lawagent_store::{Entities, GlobalState, SessionRegistry, SessionStore, VectorStore};
use tracing::{debug, warn};

const CONVERSATION_HISTORY_HEADER: &str = "=== 对话历史 ===";
const RELATED_MEMORY_HEADER: &str = "=== 相关历史记忆 ===";
const KNOWN_FACTS_HEADER: &str = "=== 当前案件已知事实 ===";

pub struct MemoryManagerConfig {
    pub session_memory_size: usize,
    pub context_window_size: usize,
    pub context_refine_threshold: usize,
    pub vector_top_k: usize,
}

/// Single owner of Session Memory (C4), Global State (C5), and the
/// Vector Store (C3) for the process.
pub struct MemoryManager {
    sessions: Mutex<SessionRegistry>,
    session_store: std::sync::Arc<SessionStore>,
    global_states: Mutex<HashMap<String, GlobalState>>,
    vector_store: std::sync::Arc<VectorStore>,
    embedding: std::sync::Arc<EmbeddingClient>,
    config: MemoryManagerConfig,
}

impl MemoryManager {
    pub fn new(
        session_store: std::sync::Arc<SessionStore>,
        vector_store: std::sync::Arc<VectorStore>,
        embedding: std::sync::Arc<EmbeddingClient>,
        config: MemoryManagerConfig,
    ) -> Self {
        Self {
            sessions: Mutex::new(SessionRegistry::new(config.session_memory_size)),
            session_store,
            global_states: Mutex::new(HashMap::new()),
            vector_store,
            embedding,
            config,
        }
    }

    /// Appends to the in-process FIFO (the eviction authority) and
    /// write-through persists to the SQLite durability log. A persistence
    /// failure is logged, not propagated — the live FIFO is never blocked
    /// on the crash-recovery log.
    pub async fn add_message(&self, message: Message, session_id: &str) {
        {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.get_or_create(session_id).add(message.clone());
        }
        if let Err(e) = self.session_store.append_message(session_id, &message).await {
            warn!(error = %e, session_id, "failed to persist session message to durability log");
        }
    }

    pub fn global_state(&self, session_id: &str) -> GlobalState {
        self.global_states.lock().unwrap().entry(session_id.to_string()).or_default().clone()
    }

    pub fn update_global_state(&self, session_id: &str, domain: Option<LegalDomain>, intent: Option<LegalIntent>, entities: Option<Entities>) {
        let mut states = self.global_states.lock().unwrap();
        states.entry(session_id.to_string()).or_default().update(domain, intent, entities);
    }

    /// Three fixed-order labeled sections, each omitted if empty.
    pub async fn get_full_context(&self, query: &str, session_id: &str) -> String {
        let mut sections = Vec::new();

        let history = {
            let sessions = self.sessions.lock().unwrap();
            sessions.get(session_id).map(|s| s.recent(self.config.context_window_size)).unwrap_or_default()
        };
        if !history.is_empty() {
            let lines: Vec<String> = history.iter().map(render_history_line).collect();
            sections.push(format!("{CONVERSATION_HISTORY_HEADER}\n{}", lines.join("\n")));
        }

        if let Some(related) = self.related_memories(query).await {
            if !related.is_empty() {
                sections.push(format!("{RELATED_MEMORY_HEADER}\n{}", related.join("\n")));
            }
        }

        let facts = self.global_state(session_id).to_context_string();
        if !facts.is_empty() {
            sections.push(format!("{KNOWN_FACTS_HEADER}\n{facts}"));
        }

        sections.join("\n\n")
    }

    async fn related_memories(&self, query: &str) -> Option<Vec<String>> {
        let embedding = match self.embedding.encode(std::slice::from_ref(&query.to_string())).await {
            Ok(mut vectors) => vectors.pop()?,
            Err(e) => {
                warn!(error = %e, "embedding call failed, degrading context to session+global only");
                return None;
            }
        };

        match self.vector_store.search(&embedding, self.config.vector_top_k, None).await {
            Ok(hits) => Some(hits.into_iter().map(|h| h.content).collect()),
            Err(e) => {
                warn!(error = %e, "vector store search failed, degrading context to session+global only");
                None
            }
        }
    }

    /// If the session is longer than `threshold`, pair up older
    /// user+assistant messages beyond the most recent `threshold`
    /// messages and archive each pair into the vector store. Append-only:
    /// never shrinks the archived count, never touches the live FIFO.
    pub async fn check_and_archive(&self, session_id: &str) -> Result<()> {
        let threshold = self.config.context_refine_threshold;
        let all = {
            let sessions = self.sessions.lock().unwrap();
            sessions.get(session_id).map(|s| s.all()).unwrap_or_default()
        };

        if all.len() <= threshold {
            return Ok(());
        }

        let archivable = &all[..all.len() - threshold];
        for pair in archivable.chunks(2) {
            let [user, assistant] = pair else { continue };
            if user.role != lawagent_core::Role::User || assistant.role != lawagent_core::Role::Assistant {
                continue;
            }
            let record = format!("User: {}\nAssistant: {}", user.content, assistant.content);
            self.archive_record(&record).await;
        }

        Ok(())
    }

    async fn archive_record(&self, record: &str) {
        let embedding = match self.embedding.encode(std::slice::from_ref(&record.to_string())).await {
            Ok(mut vectors) => vectors.pop(),
            Err(e) => {
                warn!(error = %e, "failed to embed archive record, skipping");
                None
            }
        };
        let Some(embedding) = embedding else { return };

        let mut metadata = serde_json::Map::new();
        metadata.insert("type".to_string(), serde_json::Value::String("conversation".to_string()));
        metadata.insert("archived".to_string(), serde_json::Value::Bool(true));

        if let Err(e) = self.vector_store.add(record.to_string(), embedding, metadata, None).await {
            warn!(error = %e, "failed to persist archive record");
        } else {
            debug!("archived conversation pair to vector store");
        }
    }
}

fn render_history_line(message: &Message) -> String {
    let role = match message.role {
        lawagent_core::Role::System => "System",
        lawagent_core::Role::User => "User",
        lawagent_core::Role::Assistant => "Assistant",
        lawagent_core::Role::Tool => "Tool",
    };
    format!("{role}: {}", message.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawagent_llm::EmbeddingClientConfig;
    use lawagent_store::{Database, SessionStore};
    use std::sync::Arc;

    async fn manager() -> MemoryManager {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        let session_store = Arc::new(SessionStore::new(db.clone()));
        let vector_store = Arc::new(VectorStore::new(db));
        vector_store.initialize("test", 4);
        let embedding = Arc::new(EmbeddingClient::new(EmbeddingClientConfig::new("http://x", "key", "m")).with_dimension(4));
        MemoryManager::new(
            session_store,
            vector_store,
            embedding,
            MemoryManagerConfig {
                session_memory_size: 50,
                context_window_size: 10,
                context_refine_threshold: 5,
                vector_top_k: 3,
            },
        )
    }

    #[tokio::test]
    async fn empty_session_context_has_no_sections() {
        let mgr = manager().await;
        let context = mgr.get_full_context("q", "s1").await;
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn context_includes_history_section_when_messages_present() {
        let mgr = manager().await;
        mgr.add_message(Message::user("你好"), "s1").await;
        let context = mgr.get_full_context("q", "s1").await;
        assert!(context.contains(CONVERSATION_HISTORY_HEADER));
        assert!(context.contains("你好"));
        assert!(!context.contains(RELATED_MEMORY_HEADER));
    }

    #[tokio::test]
    async fn context_includes_known_facts_section_after_global_update() {
        let mgr = manager().await;
        mgr.update_global_state("s1", Some(LegalDomain::Labor), None, None);
        let context = mgr.get_full_context("q", "s1").await;
        assert!(context.contains(KNOWN_FACTS_HEADER));
        assert!(context.contains("领域"));
    }

    #[tokio::test]
    async fn unreachable_embedding_endpoint_degrades_to_session_and_global_context() {
        // `manager()` points the embedding client at a host that refuses
        // the connection, so `related_memories` always fails; context
        // assembly must still complete using the other two sections.
        let mgr = manager().await;
        mgr.add_message(Message::user("你好"), "s1").await;
        mgr.update_global_state("s1", Some(LegalDomain::Labor), None, None);
        let context = mgr.get_full_context("q", "s1").await;
        assert!(context.contains(CONVERSATION_HISTORY_HEADER));
        assert!(context.contains(KNOWN_FACTS_HEADER));
        assert!(!context.contains(RELATED_MEMORY_HEADER));
    }

    #[tokio::test]
    async fn add_message_persists_to_the_durability_log() {
        let mgr = manager().await;
        mgr.add_message(Message::user("a"), "s1").await;
        mgr.add_message(Message::assistant("b"), "s1").await;
        assert_eq!(mgr.session_store.count("s1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn archive_is_a_no_op_below_threshold() {
        let mgr = manager().await;
        mgr.add_message(Message::user("a"), "s1").await;
        mgr.add_message(Message::assistant("b"), "s1").await;
        mgr.check_and_archive("s1").await.unwrap();
        let count = mgr.vector_store.count(None).await.unwrap();
        assert_eq!(count, 0);
    }
}
