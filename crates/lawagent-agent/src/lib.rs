//! The think/act agent loop, the domain router, and the specialist
//! agents that pair that loop with a critic pass.

pub mod json;
pub mod router;
pub mod runtime;
pub mod specialist;

pub use json::{extract_json_block, parse_json_block};
pub use router::RouterAgent;
pub use runtime::{ToolCallAgent, ToolCallAgentConfig};
pub use specialist::{SpecialistAgent, SpecialistConfig};
