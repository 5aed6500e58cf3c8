//! Shared types for the legal-consultation agent runtime: chat messages,
//! the closed domain/intent taxonomy, the agent state machine, the error
//! taxonomy, and process configuration.

pub mod config;
pub mod domain;
pub mod error;
pub mod message;
pub mod status;

pub use config::Config;
pub use domain::{AgentState, LegalDomain, LegalIntent};
pub use error::{CoreError, Result};
pub use message::{FunctionCall, Message, Role, ToolCall, prune_orphan_tool_messages};
pub use status::{StatusCallback, notify};
