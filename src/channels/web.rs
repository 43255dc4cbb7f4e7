//! Web chat channel — WebSocket chat plus REST endpoints.
//!
//! Serves the browser UI that replaces a hosted chat page: clients connect
//! to `/ws/chat`, send questions as JSON, and receive status updates and the
//! final answer back. `POST /api/ask` answers one question without holding a
//! socket open. Each session keeps a display transcript, readable via
//! `GET /api/history`, that never feeds back into the model.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::stream;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::prompt::WELCOME_MESSAGE;
use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

// ── JSON Protocol ───────────────────────────────────────────────────────

/// Message from browser client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    #[serde(rename = "message")]
    Message {
        content: String,
        session_id: Option<String>,
    },
}

/// Message from server → browser client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ServerMessage {
    #[serde(rename = "response")]
    Response {
        content: String,
        session_id: Option<String>,
    },
    #[serde(rename = "thinking")]
    Thinking { message: String },
    #[serde(rename = "tool_started")]
    ToolStarted { name: String },
    #[serde(rename = "tool_completed")]
    ToolCompleted { name: String, success: bool },
    #[serde(rename = "status")]
    Status { message: String },
}

/// One displayed entry of a session transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

// ── Shared State ────────────────────────────────────────────────────────

/// Internal state shared between the channel and WS handlers.
struct WebChannelInner {
    /// Sender for incoming messages (WS handler → Channel::start stream).
    incoming_tx: mpsc::UnboundedSender<IncomingMessage>,
    /// Broadcast sender for outgoing messages (Channel::respond → WS handlers).
    outgoing_tx: broadcast::Sender<ServerMessage>,
    /// Display transcripts by session id.
    transcripts: RwLock<HashMap<String, Vec<TranscriptEntry>>>,
}

impl WebChannelInner {
    /// Append an entry to a session transcript, seeding the welcome message
    /// the first time a session shows up.
    async fn record(&self, session_id: &str, role: &str, content: &str) {
        let mut transcripts = self.transcripts.write().await;
        let entries = transcripts
            .entry(session_id.to_string())
            .or_insert_with(|| vec![TranscriptEntry::new("assistant", WELCOME_MESSAGE)]);
        entries.push(TranscriptEntry::new(role, content));
    }
}

/// Axum handler state (cloneable).
#[derive(Clone)]
struct WsState {
    inner: Arc<WebChannelInner>,
}

// ── WebChannel ──────────────────────────────────────────────────────────

/// A WebSocket-based channel for the browser chat UI.
///
/// Architecture:
/// - `start()` returns a stream backed by an mpsc receiver. WS handlers push
///   `IncomingMessage`s into the mpsc sender when clients send JSON messages.
/// - `respond()` / `send_status()` broadcast `ServerMessage`s to all connected
///   WS clients via a `broadcast::Sender`; clients filter by session id.
/// - Multiple WS clients can connect (e.g. reconnects). Each subscribes to the
///   broadcast channel independently.
pub struct WebChannel {
    inner: Arc<WebChannelInner>,
    /// Receiver side of the incoming channel — consumed once in `start()`.
    incoming_rx: Mutex<Option<mpsc::UnboundedReceiver<IncomingMessage>>>,
}

impl WebChannel {
    /// Create a new web channel.
    pub fn new() -> Self {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, _) = broadcast::channel(256);

        let inner = Arc::new(WebChannelInner {
            incoming_tx,
            outgoing_tx,
            transcripts: RwLock::new(HashMap::new()),
        });

        Self {
            inner,
            incoming_rx: Mutex::new(Some(incoming_rx)),
        }
    }

    /// Build an Axum router with the `/ws/chat` and `/api/history` routes.
    ///
    /// Call this once and serve it from the main binary. CORS stays open
    /// since the chat page is served from a different origin.
    pub fn router(&self) -> Router {
        let state = WsState {
            inner: Arc::clone(&self.inner),
        };

        Router::new()
            .route("/ws/chat", get(ws_chat_handler))
            .route("/api/ask", post(ask_handler))
            .route("/api/history", get(history_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}

impl Default for WebChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for WebChannel {
    fn name(&self) -> &str {
        "web"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let rx = self
            .incoming_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::StartupFailed {
                name: "web".to_string(),
                reason: "start() already called".to_string(),
            })?;

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        if let Some(session_id) = &msg.session_id {
            self.inner
                .record(session_id, "assistant", &response.content)
                .await;
        }
        let server_msg = ServerMessage::Response {
            content: response.content,
            session_id: msg.session_id.clone(),
        };
        // Ignore send errors — no subscribers means no connected clients
        let _ = self.inner.outgoing_tx.send(server_msg);
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        let server_msg = match status {
            StatusUpdate::Thinking(msg) => ServerMessage::Thinking { message: msg },
            StatusUpdate::ToolStarted { name } => ServerMessage::ToolStarted { name },
            StatusUpdate::ToolCompleted { name, success } => {
                ServerMessage::ToolCompleted { name, success }
            }
            StatusUpdate::Status(msg) => ServerMessage::Status { message: msg },
        };

        let _ = self.inner.outgoing_tx.send(server_msg);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

// ── HTTP Handlers ───────────────────────────────────────────────────────

/// How long a one-shot REST ask waits for the agent to answer.
const ASK_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
    session_id: Option<String>,
}

/// Answer one question over plain REST.
///
/// The question is queued like any WS message; the handler then watches the
/// outgoing broadcast for the response carrying its session id.
async fn ask_handler(
    State(state): State<WsState>,
    Json(body): Json<AskRequest>,
) -> impl IntoResponse {
    let question = body.question.trim().to_string();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "question must not be empty"})),
        );
    }
    let session_id = body.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    // Subscribe before queueing so the answer cannot slip past.
    let mut outgoing_rx = state.inner.outgoing_tx.subscribe();

    state.inner.record(&session_id, "user", &question).await;
    let msg = IncomingMessage::new("web", "web-user", &question).with_session(&session_id);
    if state.inner.incoming_tx.send(msg).is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "Agent is not running"})),
        );
    }

    let answer = tokio::time::timeout(ASK_TIMEOUT, async {
        loop {
            match outgoing_rx.recv().await {
                Ok(ServerMessage::Response {
                    content,
                    session_id: sid,
                }) if sid.as_deref() == Some(session_id.as_str()) => {
                    return Some(content);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await;

    match answer {
        Ok(Some(content)) => (
            StatusCode::OK,
            Json(serde_json::json!({"session_id": session_id, "answer": content})),
        ),
        Ok(None) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "Agent is not running"})),
        ),
        Err(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(serde_json::json!({"error": "Timed out waiting for an answer"})),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    session_id: String,
}

/// Return the display transcript of one session.
async fn history_handler(
    State(state): State<WsState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<TranscriptEntry>> {
    let transcripts = state.inner.transcripts.read().await;
    Json(transcripts.get(&params.session_id).cloned().unwrap_or_default())
}

async fn ws_chat_handler(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    info!("Web chat client connecting");
    ws.on_upgrade(|socket| handle_chat_socket(socket, state.inner))
}

async fn handle_chat_socket(mut socket: WebSocket, inner: Arc<WebChannelInner>) {
    info!("Web chat client connected");

    // Greet this client only; broadcasts would reach everyone.
    if let Ok(json) = serde_json::to_string(&ServerMessage::Status {
        message: WELCOME_MESSAGE.to_string(),
    }) {
        if socket.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    // Sessions the client does not name fall back to a connection-scoped id.
    let default_session = Uuid::new_v4().to_string();

    // Subscribe to outgoing broadcast (responses + status updates)
    let mut outgoing_rx = inner.outgoing_tx.subscribe();

    loop {
        tokio::select! {
            // Forward server messages to this WS client
            result = outgoing_rx.recv() => {
                match result {
                    Ok(msg) => {
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                debug!("Web chat client disconnected during send");
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "Web chat client lagged behind broadcast");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Web chat broadcast channel closed");
                        break;
                    }
                }
            }

            // Receive messages from the browser client
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Message { content, session_id }) => {
                                let content = content.trim().to_string();
                                if content.is_empty() {
                                    continue;
                                }
                                let session_id =
                                    session_id.unwrap_or_else(|| default_session.clone());
                                inner.record(&session_id, "user", &content).await;
                                let msg = IncomingMessage::new("web", "web-user", &content)
                                    .with_session(&session_id);
                                if inner.incoming_tx.send(msg).is_err() {
                                    warn!("Web incoming channel closed");
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!(error = %e, text = %text, "Invalid JSON from web client");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Web chat client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Web chat WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("Web chat connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transcript_seeds_welcome_on_first_entry() {
        let channel = WebChannel::new();
        channel.inner.record("s1", "user", "¿Cuántos viajes hay?").await;

        let transcripts = channel.inner.transcripts.read().await;
        let entries = transcripts.get("s1").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, "assistant");
        assert!(entries[0].content.contains("CitiBike"));
        assert_eq!(entries[1].role, "user");
    }

    #[tokio::test]
    async fn respond_records_assistant_entry() {
        let channel = WebChannel::new();
        let msg = IncomingMessage::new("web", "web-user", "hola").with_session("s2");
        channel.inner.record("s2", "user", "hola").await;
        channel
            .respond(&msg, OutgoingResponse::text("¡Hola! ¿En qué te ayudo?"))
            .await
            .unwrap();

        let transcripts = channel.inner.transcripts.read().await;
        let entries = transcripts.get("s2").unwrap();
        assert_eq!(entries.last().unwrap().role, "assistant");
        assert_eq!(entries.last().unwrap().content, "¡Hola! ¿En qué te ayudo?");
    }

    #[tokio::test]
    async fn start_can_only_be_called_once() {
        let channel = WebChannel::new();
        assert!(channel.start().await.is_ok());
        assert!(matches!(
            channel.start().await,
            Err(ChannelError::StartupFailed { .. })
        ));
    }
}
