//! WebSocket Handler
//!
//! Conversation over `/ws/conversation`: one client frame per turn, status
//! frames while the turn runs, then the committed turn.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use lingua_agent::{AgentError, AgentEvent, TurnResult, TurnStep};
use lingua_core::{CefrLevel, ConversationTurn};

use crate::metrics::{record_error, record_turn};
use crate::state::AppState;

/// Frames sent by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Typed input
    Text { content: String },
    /// Recorded audio (base64 encoded)
    Audio { content: String },
}

/// Synthesized reply audio
#[derive(Debug, Clone, Serialize)]
pub struct AudioPayload {
    /// Base64 encoded audio
    pub data: String,
    pub mime_type: String,
    pub voice: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub turn: u32,
    pub level: CefrLevel,
}

/// Frames sent by the server
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Status {
        step: TurnStep,
    },
    TurnResponse {
        turn: Box<ConversationTurn>,
        audio: Option<AudioPayload>,
        session: SessionSummary,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    fn from_turn(result: TurnResult) -> Self {
        let audio = result.speech.map(|speech| AudioPayload {
            data: BASE64.encode(&speech.audio),
            mime_type: speech.mime_type,
            voice: speech.voice,
        });
        ServerMessage::TurnResponse {
            session: SessionSummary {
                turn: result.next_turn,
                level: result.level,
            },
            turn: Box::new(ConversationTurn {
                turn_number: result.turn_number,
                user_said: result.user_said,
                response: result.response,
            }),
            audio,
        }
    }
}

/// Parse one client frame
pub fn parse_client_message(text: &str) -> Result<ClientMessage, String> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {}", e))?;
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();
    if kind != "text" && kind != "audio" {
        return Err(format!("Unknown message type: {}", kind));
    }
    serde_json::from_value(value).map_err(|e| format!("Invalid {} message: {}", kind, e))
}

/// WebSocket handler
pub struct WebSocketHandler;

impl WebSocketHandler {
    /// Handle WebSocket upgrade
    pub async fn handle(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
        ws.on_upgrade(move |socket| Self::handle_socket(socket, state))
    }

    /// Handle WebSocket connection
    async fn handle_socket(mut socket: WebSocket, state: AppState) {
        tracing::info!("WebSocket client connected");

        while let Some(frame) = socket.recv().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket receive failed");
                    break;
                }
            };

            let reply = match parse_client_message(&text) {
                Ok(message) => Self::run_turn(&mut socket, &state, message).await,
                Err(message) => ServerMessage::error(message),
            };
            if Self::send(&mut socket, &reply).await.is_err() {
                break;
            }
        }

        tracing::info!("WebSocket client disconnected");
    }

    /// Run one turn, forwarding status steps as they happen
    async fn run_turn(socket: &mut WebSocket, state: &AppState, message: ClientMessage) -> ServerMessage {
        let mut events = state.agent.subscribe();
        let agent = state.agent.clone();

        let turn = async move {
            match message {
                ClientMessage::Text { content } => agent.process_text(&content).await,
                ClientMessage::Audio { content } => {
                    let audio = BASE64
                        .decode(content.as_bytes())
                        .map_err(|e| AgentError::Transcription(format!("invalid base64 audio: {}", e)))?;
                    agent.process_audio(&audio).await
                }
            }
        };
        tokio::pin!(turn);

        let result = loop {
            tokio::select! {
                biased;
                event = events.recv() => {
                    if let Some(step) = status_step(event) {
                        let _ = Self::send(socket, &ServerMessage::Status { step }).await;
                    }
                }
                result = &mut turn => break result,
            }
        };
        // Steps emitted right before the turn finished
        while let Ok(event) = events.try_recv() {
            if let AgentEvent::Status(step) = event {
                let _ = Self::send(socket, &ServerMessage::Status { step }).await;
            }
        }

        match result {
            Ok(result) => {
                record_turn(&result.response);
                ServerMessage::from_turn(result)
            }
            Err(e) => {
                record_error("turn");
                tracing::warn!(error = %e, "Conversation turn failed");
                ServerMessage::error(e.to_string())
            }
        }
    }

    async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
        match serde_json::to_string(message) {
            Ok(json) => socket.send(Message::Text(json)).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize server message");
                Ok(())
            }
        }
    }
}

fn status_step(event: Result<AgentEvent, broadcast::error::RecvError>) -> Option<TurnStep> {
    match event {
        Ok(AgentEvent::Status(step)) => Some(step),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_frames() {
        assert!(matches!(
            parse_client_message(r#"{"type": "text", "content": "Bonjour"}"#),
            Ok(ClientMessage::Text { .. })
        ));
        assert!(matches!(
            parse_client_message(r#"{"type": "audio", "content": "AAEC"}"#),
            Ok(ClientMessage::Audio { .. })
        ));
        assert_eq!(
            parse_client_message(r#"{"type": "video", "content": ""}"#).unwrap_err(),
            "Unknown message type: video"
        );
        assert!(parse_client_message("not json").unwrap_err().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_server_frame_shapes() {
        let status = serde_json::to_value(ServerMessage::Status {
            step: TurnStep::Thinking,
        })
        .unwrap();
        assert_eq!(status, serde_json::json!({"type": "status", "step": "thinking"}));

        let error = serde_json::to_value(ServerMessage::error("boom")).unwrap();
        assert_eq!(error, serde_json::json!({"type": "error", "message": "boom"}));
    }
}
