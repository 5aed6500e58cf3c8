//! Session Memory: a bounded FIFO of role-tagged messages per session,
//! with a SQLite durability log behind it.
//!
//! The in-memory `VecDeque` is the sole authority for eviction and for
//! `recent`/`all` within a process lifetime; the SQLite table is a
//! crash-recovery log, not the hot path. Not thread-safe by contract —
//! callers serialize per session id.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use lawagent_core::Message;
use tracing::debug;

use crate::db::Database;
use crate::error::StoreResult;

/// A bounded FIFO of messages for one session. Oldest-eviction on overflow.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    capacity: usize,
    messages: VecDeque<Message>,
}

impl SessionMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            messages: VecDeque::new(),
        }
    }

    /// Append a message, evicting the oldest if at capacity.
    pub fn add(&mut self, message: Message) {
        if self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// The last `n` messages, in insertion order.
    pub fn recent(&self, n: usize) -> Vec<Message> {
        let len = self.messages.len();
        let skip = len.saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// The full window, in insertion order.
    pub fn all(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Process-wide registry of per-session [`SessionMemory`] instances, keyed
/// by session id, created lazily on first message.
#[derive(Default)]
pub struct SessionRegistry {
    capacity: usize,
    sessions: HashMap<String, SessionMemory>,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sessions: HashMap::new(),
        }
    }

    pub fn get_or_create(&mut self, session_id: &str) -> &mut SessionMemory {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionMemory::new(self.capacity))
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionMemory> {
        self.sessions.get(session_id)
    }
}

/// SQLite durability log for session messages — write-through, read on
/// recovery only.
#[derive(Clone)]
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn append_message(&self, session_id: &str, message: &Message) -> StoreResult<i64> {
        let session_id = session_id.to_string();
        let role = format!("{:?}", message.role).to_lowercase();
        let content = message.content.clone();
        let tool_calls = message
            .tool_calls
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let tool_call_id = message.tool_call_id.clone();
        let name = message.name.clone();
        let now = Utc::now().timestamp();
        let session_id_for_log = session_id.clone();

        let id = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO session_messages (session_id, role, content, tool_calls, tool_call_id, name, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![session_id, role, content, tool_calls, tool_call_id, name, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!(session_id = %session_id_for_log, role = message.role_label(), "session message persisted");
        Ok(id)
    }

    pub async fn count(&self, session_id: &str) -> StoreResult<i64> {
        let session_id = session_id.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn.query_row(
                    "SELECT count(*) FROM session_messages WHERE session_id = ?1",
                    [session_id],
                    |row| row.get(0),
                )?)
            })
            .await
    }
}

trait RoleLabel {
    fn role_label(&self) -> &'static str;
}

impl RoleLabel for Message {
    fn role_label(&self) -> &'static str {
        match self.role {
            lawagent_core::Role::System => "system",
            lawagent_core::Role::User => "user",
            lawagent_core::Role::Assistant => "assistant",
            lawagent_core::Role::Tool => "tool",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_evicts_oldest_when_over_capacity() {
        let mut mem = SessionMemory::new(3);
        mem.add(Message::user("1"));
        mem.add(Message::user("2"));
        mem.add(Message::user("3"));
        mem.add(Message::user("4"));
        assert_eq!(mem.len(), 3);
        let all = mem.all();
        assert_eq!(all[0].content, "2");
        assert_eq!(all[2].content, "4");
    }

    #[test]
    fn recent_returns_last_n_in_order() {
        let mut mem = SessionMemory::new(10);
        for i in 0..5 {
            mem.add(Message::user(i.to_string()));
        }
        let recent = mem.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "3");
        assert_eq!(recent[1].content, "4");
    }

    #[test]
    fn recent_on_empty_session_is_empty() {
        let mem = SessionMemory::new(10);
        assert!(mem.recent(5).is_empty());
        assert!(mem.all().is_empty());
    }

    #[tokio::test]
    async fn session_store_persists_and_counts_messages() {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        let store = SessionStore::new(db);

        store.append_message("s1", &Message::user("hi")).await.unwrap();
        store
            .append_message("s1", &Message::assistant("hello"))
            .await
            .unwrap();

        assert_eq!(store.count("s1").await.unwrap(), 2);
        assert_eq!(store.count("s2").await.unwrap(), 0);
    }

    #[test]
    fn registry_creates_session_lazily() {
        let mut registry = SessionRegistry::new(5);
        assert!(registry.get("a").is_none());
        registry.get_or_create("a").add(Message::user("hi"));
        assert_eq!(registry.get("a").unwrap().len(), 1);
    }
}
