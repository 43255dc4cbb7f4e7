//! Error types for the CitiBike analyst.

use std::time::Duration;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Credentials file not found at {path}: {reason}")]
    CredentialsNotFound { path: String, reason: String },

    #[error("Failed to initialize {component}: {reason}")]
    Init { component: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Warehouse query errors.
///
/// The `Display` text of every variant travels back to the model as tool
/// output, so it carries the backend's message verbatim. `kind` gives a
/// stable label for logs and tests.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Query timed out: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response from warehouse: {0}")]
    InvalidResponse(String),

    #[error("Warehouse error: {0}")]
    Other(String),
}

impl WarehouseError {
    pub fn kind(&self) -> &'static str {
        match self {
            WarehouseError::InvalidQuery(_) => "invalid_query",
            WarehouseError::AccessDenied(_) => "access_denied",
            WarehouseError::Timeout(_) => "timeout",
            WarehouseError::Auth(_) => "auth",
            WarehouseError::Transport(_) => "transport",
            WarehouseError::InvalidResponse(_) => "invalid_response",
            WarehouseError::Other(_) => "other",
        }
    }
}

/// Tool registration and execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Agent loop errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Model kept requesting tools after {limit} rounds")]
    RoundLimit { limit: usize },

    #[error("Model returned neither text nor tool calls")]
    EmptyResponse,
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
