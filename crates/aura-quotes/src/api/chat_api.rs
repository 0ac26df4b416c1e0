//! Chat endpoints: conversation turns, feedback, and session history

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub tool_calls: serde_json::Value,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message cannot be empty".to_string()));
    }

    info!("Chat request (session={:?})", payload.session_id);

    match state
        .agent
        .process_message(&payload.message, payload.session_id.as_deref())
        .await
    {
        Ok(outcome) => {
            let tool_calls = json!({
                "mood_analysis": outcome.verdict,
                "tools_invoked": outcome
                    .outcomes
                    .iter()
                    .map(|o| o.tool.as_str())
                    .collect::<Vec<_>>(),
                "tool_results": outcome.outcomes,
                "retrieval_context": outcome.retrieval_context,
            });

            Ok(Json(ChatResponse {
                response: outcome.response,
                session_id: outcome.session_id,
                tool_calls,
            }))
        }
        Err(e) => {
            error!("Chat processing error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Chat processing error".to_string(),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub message: String,
    pub response: String,
    pub feedback: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub is_correction: bool,
}

pub async fn feedback(
    State(state): State<AppState>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.feedback.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Feedback cannot be empty".to_string()));
    }

    state
        .agent
        .record_feedback(
            &payload.message,
            &payload.response,
            &payload.feedback,
            payload.session_id.as_deref(),
            payload.is_correction,
        )
        .await;

    Ok(Json(json!({
        "success": true,
        "is_correction": payload.is_correction,
    })))
}

pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let turns = state.agent.sessions().history(&session_id);
    let profile = state.agent.sessions().mood_profile(&session_id);

    let persisted = state
        .agent
        .database()
        .conversations
        .get_session_messages(&session_id)
        .map_err(|e| {
            error!("Failed to fetch history: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
            )
        })?;

    Ok(Json(json!({
        "session_id": session_id,
        "messages": persisted,
        "conversation_stats": {
            "message_count": turns.len(),
            "recent_moods": turns
                .iter()
                .rev()
                .take(5)
                .map(|t| t.verdict.category)
                .collect::<Vec<_>>(),
            "favorite_categories": profile.favorite_categories,
            "average_confidence": profile.average_confidence,
        },
    })))
}

/// Available tools with their parameter schemas.
pub async fn tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "tools": state.agent.registry().describe() }))
}
