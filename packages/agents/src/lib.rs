// ABOUTME: Agent hierarchy management for Tasklane
// ABOUTME: Admins manage agents, agents manage their own sub-agents

pub mod storage;
pub mod types;

pub use storage::AgentStorage;
pub use types::{Agent, AgentCreateInput, AgentUpdateInput, UserType};
