//! Persistence: the session FIFO's durability log, per-conversation global
//! state, and the SQLite-backed vector store.

pub mod db;
pub mod error;
pub mod global;
pub mod migration;
pub mod session;
pub mod vector;

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use global::{Entities, GlobalState};
pub use session::{SessionMemory, SessionRegistry, SessionStore};
pub use vector::{Filter, SearchHit, VectorRecord, VectorStore};
