//! HTTP Endpoints
//!
//! REST API over the tutor session and its knowledge graph.

use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lingua_core::{CefrLevel, ConversationTurn, GraphLink, GraphNode, KnowledgeGraph, SessionState};

use crate::metrics::{metrics_handler, record_error, record_turn};
use crate::state::AppState;
use crate::websocket::WebSocketHandler;
use crate::ServerError;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_origins, state.config.server.cors_enabled);
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        // Session endpoints
        .route("/api/session/state", get(session_state))
        .route("/api/session/diagnostics", get(session_diagnostics))
        .route("/api/session/reset", post(session_reset))
        // Knowledge graph
        .route("/api/graph", get(graph))
        .route("/api/graph/nodes", get(graph_nodes))
        .route("/api/graph/links", get(graph_links))
        // Text turn
        .route("/api/turn", post(text_turn))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        // WebSocket
        .route("/ws/conversation", get(WebSocketHandler::handle))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let allowed = if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to {}", DEFAULT_CORS_ORIGIN);
        vec![HeaderValue::from_static(DEFAULT_CORS_ORIGIN)]
    } else {
        tracing::info!("CORS configured with {} origins", parsed_origins.len());
        parsed_origins
    };

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn session_state(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.agent.session().snapshot())
}

async fn session_diagnostics(State(state): State<AppState>) -> Json<serde_json::Value> {
    let items = state
        .agent
        .session()
        .diagnostics(state.config.tutor.diagnostics_window);
    Json(serde_json::json!({ "items": items }))
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    status: &'static str,
    turn: u32,
}

async fn session_reset(State(state): State<AppState>) -> Json<ResetResponse> {
    let turn = state.agent.reset().await;
    Json(ResetResponse {
        status: "reset",
        turn,
    })
}

async fn graph(State(state): State<AppState>) -> Json<KnowledgeGraph> {
    Json(state.agent.graph())
}

async fn graph_nodes(State(state): State<AppState>) -> Json<Vec<GraphNode>> {
    Json(state.agent.graph().nodes)
}

async fn graph_links(State(state): State<AppState>) -> Json<Vec<GraphLink>> {
    Json(state.agent.graph().links)
}

/// Text turn request
#[derive(Debug, Deserialize)]
struct TurnRequest {
    content: String,
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    turn: u32,
    level: CefrLevel,
}

/// Text turn response
#[derive(Debug, Serialize)]
struct TurnResponse {
    turn: ConversationTurn,
    session: SessionSummary,
}

async fn text_turn(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ServerError> {
    let result = state.agent.process_text(&request.content).await.map_err(|e| {
        record_error("turn");
        tracing::warn!(error = %e, "Text turn failed");
        ServerError::from(e)
    })?;
    record_turn(&result.response);

    Ok(Json(TurnResponse {
        session: SessionSummary {
            turn: result.next_turn,
            level: result.level,
        },
        turn: ConversationTurn {
            turn_number: result.turn_number,
            user_said: result.user_said,
            response: result.response,
        },
    }))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ready",
            "tutor": state.agent.tutor_name(),
            "stt": state.agent.has_stt(),
            "turn": state.agent.session().turn(),
        })),
    )
}
