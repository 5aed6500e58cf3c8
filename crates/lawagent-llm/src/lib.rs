//! LLM and embedding clients: typed wrappers over an OpenAI-compatible
//! chat-completions endpoint and an embeddings endpoint, both with
//! timeout + exponential-backoff retry.

pub mod client;
pub mod embedding;
mod retry;
pub mod types;

pub use client::{LlmClient, LlmClientConfig};
pub use embedding::{EmbeddingClient, EmbeddingClientConfig};
pub use types::{FunctionSchema, ToolChatResponse, ToolChoice, ToolSchema, Usage};
