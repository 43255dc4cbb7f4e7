//! Channel manager — owns the chat surfaces and routes traffic between
//! them and the agent.

use futures::stream::{self, StreamExt};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

/// Collection of active channels with name-based response routing.
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Start every channel and merge their message streams into one.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            tracing::info!(channel = channel.name(), "Starting channel");
            streams.push(channel.start().await?);
        }
        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Deliver a response on the channel the message came from.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        match self.find(&msg.channel) {
            Some(channel) => channel.respond(msg, response).await,
            None => {
                tracing::warn!(channel = %msg.channel, "No channel to deliver response on");
                Ok(())
            }
        }
    }

    /// Push a status update to the named channel.
    pub async fn send_status(
        &self,
        channel: &str,
        status: StatusUpdate,
        metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        match self.find(channel) {
            Some(target) => target.send_status(status, metadata).await,
            None => Ok(()),
        }
    }

    /// Shut down every channel, logging failures instead of aborting.
    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                tracing::warn!(channel = channel.name(), error = %e, "Channel shutdown failed");
            }
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&dyn Channel> {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;

    struct RecordingChannel {
        name: &'static str,
        responses: Arc<Mutex<Vec<String>>>,
        statuses: Arc<Mutex<Vec<StatusUpdate>>>,
    }

    impl RecordingChannel {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                responses: Arc::new(Mutex::new(Vec::new())),
                statuses: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            Ok(Box::pin(stream::empty()))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.responses.lock().await.push(response.content);
            Ok(())
        }

        async fn send_status(
            &self,
            status: StatusUpdate,
            _metadata: &serde_json::Value,
        ) -> Result<(), ChannelError> {
            self.statuses.lock().await.push(status);
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn routes_response_to_originating_channel() {
        let cli = RecordingChannel::new("cli");
        let web = RecordingChannel::new("web");
        let cli_responses = cli.responses.clone();
        let web_responses = web.responses.clone();

        let mut manager = ChannelManager::new();
        manager.add(Box::new(cli));
        manager.add(Box::new(web));
        assert_eq!(manager.names(), vec!["cli", "web"]);

        let msg = IncomingMessage::new("web", "u1", "hola");
        manager
            .respond(&msg, OutgoingResponse::text("respuesta"))
            .await
            .unwrap();

        assert!(cli_responses.lock().await.is_empty());
        assert_eq!(*web_responses.lock().await, vec!["respuesta".to_string()]);
    }

    #[tokio::test]
    async fn unknown_channel_is_not_an_error() {
        let manager = ChannelManager::new();
        let msg = IncomingMessage::new("ghost", "u1", "hola");
        assert!(manager
            .respond(&msg, OutgoingResponse::text("x"))
            .await
            .is_ok());
        assert!(manager
            .send_status("ghost", StatusUpdate::Status("x".to_string()), &serde_json::Value::Null)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn status_reaches_named_channel() {
        let web = RecordingChannel::new("web");
        let statuses = web.statuses.clone();
        let mut manager = ChannelManager::new();
        manager.add(Box::new(web));

        manager
            .send_status(
                "web",
                StatusUpdate::ToolStarted {
                    name: "run_sql_query".to_string(),
                },
                &serde_json::Value::Null,
            )
            .await
            .unwrap();

        let recorded = statuses.lock().await;
        assert_eq!(recorded.len(), 1);
        assert!(matches!(
            recorded[0],
            StatusUpdate::ToolStarted { .. }
        ));
    }
}
