//! Agent module — the coordinator, the turn loop, and the system prompt.

pub mod agent_loop;
pub mod prompt;
pub mod turn;

pub use agent_loop::Agent;
pub use turn::seed_conversation;
