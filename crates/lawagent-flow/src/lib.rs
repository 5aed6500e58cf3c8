//! Composes the memory subsystem with the Router + Specialist pool into
//! the single request pipeline the binary drives.

pub mod flow;
pub mod memory;

pub use flow::Flow;
pub use lawagent_core::StatusCallback;
pub use memory::{MemoryManager, MemoryManagerConfig};
