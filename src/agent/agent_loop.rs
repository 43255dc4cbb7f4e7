//! Main agent loop — coordinator module.
//!
//! The Agent struct, its constructor, the serving loop, and status routing.
//! The per-question model/tool loop lives in `turn`.

use std::sync::Arc;

use futures::StreamExt;

use crate::agent::turn::seed_conversation;
use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse, StatusUpdate};
use crate::config::AgentConfig;
use crate::error::Error;
use crate::llm::LlmProvider;
use crate::tools::ToolRegistry;

/// Reply sent when answering a question fails outright.
const FAILURE_MESSAGE: &str = "Lo siento, ocurrió un error al procesar tu pregunta. \
                               Por favor, inténtalo de nuevo en unos momentos.";

/// The main agent that coordinates all components.
pub struct Agent {
    pub(crate) config: AgentConfig,
    pub(crate) llm: Arc<dyn LlmProvider>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) channels: Arc<ChannelManager>,
}

impl Agent {
    /// Create a new agent.
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        channels: ChannelManager,
    ) -> Self {
        Self {
            config,
            llm,
            tools,
            channels: Arc::new(channels),
        }
    }

    /// Answer a single question, start to finish.
    ///
    /// Every question gets a fresh conversation; nothing carries over
    /// between calls.
    pub async fn answer(&self, question: &str) -> Result<String, Error> {
        let mut messages = seed_conversation(question);
        self.run_loop(&mut messages, None).await
    }

    /// Run the agent main loop.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        tracing::info!(
            model = self.llm.model_name(),
            "Analyst agent ready and listening"
        );

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            match self.handle_message(&message).await {
                Ok(answer) => {
                    let _ = self
                        .channels
                        .respond(&message, OutgoingResponse::text(answer))
                        .await;
                }
                Err(e) => {
                    tracing::error!("Error answering question: {}", e);
                    let _ = self
                        .channels
                        .respond(&message, OutgoingResponse::text(FAILURE_MESSAGE))
                        .await;
                }
            }
        }

        tracing::info!("Agent shutting down...");
        self.channels.shutdown_all().await?;
        Ok(())
    }

    async fn handle_message(&self, message: &IncomingMessage) -> Result<String, Error> {
        tracing::debug!(
            channel = %message.channel,
            chars = message.content.len(),
            "Received question"
        );
        self.emit_status(
            Some(message),
            StatusUpdate::Thinking("Analizando tu pregunta...".to_string()),
        )
        .await;
        let mut messages = seed_conversation(&message.content);
        self.run_loop(&mut messages, Some(message)).await
    }

    /// Push a status update to the channel the question came from.
    pub(crate) async fn emit_status(&self, origin: Option<&IncomingMessage>, status: StatusUpdate) {
        if let Some(message) = origin {
            if let Err(e) = self
                .channels
                .send_status(&message.channel, status, &message.metadata)
                .await
            {
                tracing::debug!(
                    channel = %message.channel,
                    error = %e,
                    "Status update not delivered"
                );
            }
        }
    }
}
