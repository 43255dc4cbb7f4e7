//! Tool abstraction for agent capabilities.

pub mod registry;
pub mod sql;
pub mod tool;

pub use registry::ToolRegistry;
pub use sql::RunSqlQueryTool;
pub use tool::*;
