//! Error taxonomy shared across the runtime.
//!
//! Every crate in the workspace maps its failures onto [`CoreError`] at its
//! boundary (directly, or via a crate-local enum with a `#[from]`
//! conversion) so that callers several layers up can match on the same
//! fixed set of kinds, regardless of which component produced them.

use thiserror::Error;

/// Alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// The error kinds shared across the runtime's components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An external call (LLM, embedding, tool HTTP) exceeded its deadline.
    #[error("timeout after {seconds}s: {detail}")]
    Timeout { seconds: u64, detail: String },

    /// A non-timeout failure from an external provider: non-2xx status,
    /// malformed response body, or a transport-level error.
    #[error("provider error: {0}")]
    ProviderError(String),

    /// An LLM reply could not be parsed as the expected JSON shape.
    #[error("parse error: {0}")]
    ParseError(String),

    /// A tool invocation raised or returned a failure.
    #[error("tool `{tool_name}` failed: {reason}")]
    ToolError { tool_name: String, reason: String },

    /// An agent was asked to `run` while not in `Idle` state, or some
    /// other state-machine invariant was violated.
    #[error("state error: {0}")]
    StateError(String),

    /// A required secret or setting was missing at configuration time.
    #[error("config error: {0}")]
    ConfigError(String),

    /// JSON (de)serialization failure outside the LLM-reply-parsing path.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors. Prefer a typed variant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::ProviderError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn tool(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolError {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::StateError(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether this error is worth retrying (timeout or opaque transport
    /// failure), as opposed to something retrying won't fix (auth,
    /// malformed schema, parse errors).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
