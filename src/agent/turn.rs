//! Turn controller: the model/tool loop behind every question.
//!
//! Each question runs in its own fresh conversation seeded with the system
//! instruction. The model either answers in text or requests tool calls;
//! call results are appended in request order and the transcript goes back
//! to the model, until it answers or the round limit trips.

use crate::agent::agent_loop::Agent;
use crate::agent::prompt::build_system_instruction;
use crate::channels::{IncomingMessage, StatusUpdate};
use crate::error::{AgentError, Error};
use crate::llm::{ChatMessage, ToolCompletionRequest};

/// Seed a fresh conversation for one user question.
pub fn seed_conversation(question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(build_system_instruction()),
        ChatMessage::user(question),
    ]
}

impl Agent {
    /// Drive the model/tool loop until the model answers in text.
    ///
    /// Tool failures are folded into the transcript as `Error: ...` results
    /// so the model can correct itself; model failures propagate.
    pub(crate) async fn run_loop(
        &self,
        messages: &mut Vec<ChatMessage>,
        origin: Option<&IncomingMessage>,
    ) -> Result<String, Error> {
        let tools = self.tools.tool_definitions().await;

        for round in 0..self.config.max_rounds {
            let request = ToolCompletionRequest::new(messages.clone(), tools.clone())
                .with_temperature(self.config.temperature);
            let response = self.llm.complete_with_tools(request).await?;

            if response.tool_calls.is_empty() {
                let Some(answer) = response.content.filter(|c| !c.trim().is_empty()) else {
                    return Err(AgentError::EmptyResponse.into());
                };
                tracing::debug!(round, "Model produced final answer");
                messages.push(ChatMessage::assistant(answer.clone()));
                return Ok(answer);
            }

            tracing::debug!(
                round,
                calls = response.tool_calls.len(),
                "Model requested tools"
            );
            let calls = response.tool_calls;
            messages.push(ChatMessage::assistant_with_tools(
                response.content,
                calls.clone(),
            ));

            for call in calls {
                self.emit_status(
                    origin,
                    StatusUpdate::ToolStarted {
                        name: call.name.clone(),
                    },
                )
                .await;
                let (text, success) = match self.tools.execute(&call.name, call.arguments).await {
                    Ok(output) => {
                        tracing::debug!(
                            tool = %call.name,
                            elapsed_ms = output.duration.as_millis() as u64,
                            "Tool call finished"
                        );
                        (output.text, true)
                    }
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                        (format!("Error: {e}"), false)
                    }
                };
                self.emit_status(
                    origin,
                    StatusUpdate::ToolCompleted {
                        name: call.name.clone(),
                        success,
                    },
                )
                .await;
                messages.push(ChatMessage::tool_result(call.id, text));
            }
        }

        Err(AgentError::RoundLimit {
            limit: self.config.max_rounds,
        }
        .into())
    }
}
