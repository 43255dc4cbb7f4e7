//! Channel trait and message types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;

/// A question arriving from a chat surface.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Name of the channel that produced this message.
    pub channel: String,
    /// Stable id of the asking user.
    pub user_id: String,
    /// The question text.
    pub content: String,
    /// Session id for surfaces that keep a display transcript.
    pub session_id: Option<String>,
    /// Channel-specific routing data, opaque to the agent.
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            session_id: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }
}

/// A final answer heading back to the user.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    pub content: String,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Progress updates surfaced while a question is being answered.
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    Thinking(String),
    ToolStarted { name: String },
    ToolCompleted { name: String, success: bool },
    Status(String),
}

/// Stream of incoming messages produced by a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A chat surface the agent can serve.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name, used to route responses back.
    fn name(&self) -> &str;

    /// Start the channel and return its stream of incoming messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver a final answer for a previously received message.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Push a progress update to the user.
    async fn send_status(
        &self,
        status: StatusUpdate,
        metadata: &serde_json::Value,
    ) -> Result<(), ChannelError>;

    /// Stop the channel.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_message_defaults() {
        let msg = IncomingMessage::new("cli", "local-user", "¿Cuántos viajes hay?");
        assert_eq!(msg.channel, "cli");
        assert_eq!(msg.session_id, None);
        assert!(msg.metadata.is_null());

        let msg = msg.with_session("abc-123");
        assert_eq!(msg.session_id.as_deref(), Some("abc-123"));
    }
}
