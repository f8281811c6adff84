use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ai::llm::ChatModel;
use crate::chat::{ChatReply, ChatTurn};
use crate::db::models::{Conversation, HistoryEntry};
use crate::db::ChatRepository;
use crate::http::error::{ApiError, CHAT_FAILED, DELETE_FAILED};
use crate::http::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub store: &'static str,
}

/// Sidebar view of a conversation.
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationSummary {
    fn from(conv: Conversation) -> Self {
        Self { id: conv.id, title: conv.title, created_at: conv.created_at }
    }
}

// GET /health
pub async fn health<R: ChatRepository, M: ChatModel>(
    State(state): State<Arc<AppState<R, M>>>,
) -> Json<Health> {
    let store = if state.chat.store().is_enabled() { "enabled" } else { "disabled" };
    Json(Health { status: "ok", store })
}

// GET /conversations/{user_id}
pub async fn list_conversations<R: ChatRepository, M: ChatModel>(
    State(state): State<Arc<AppState<R, M>>>,
    Path(user_id): Path<String>,
) -> Json<Vec<ConversationSummary>> {
    let convs = state.chat.list_conversations(&user_id).await;
    Json(convs.into_iter().map(ConversationSummary::from).collect())
}

// GET /history/{conversation_id}
pub async fn get_history<R: ChatRepository, M: ChatModel>(
    State(state): State<Arc<AppState<R, M>>>,
    Path(conversation_id): Path<i64>,
) -> Json<Vec<HistoryEntry>> {
    Json(state.chat.history(conversation_id).await)
}

// DELETE /conversation/{conversation_id}
pub async fn delete_conversation<R: ChatRepository, M: ChatModel>(
    State(state): State<Arc<AppState<R, M>>>,
    Path(conversation_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .chat
        .delete_conversation(conversation_id)
        .await
        .map_err(|e| ApiError::from_chat(DELETE_FAILED, e))?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /chat
pub async fn chat<R: ChatRepository, M: ChatModel>(
    State(state): State<Arc<AppState<R, M>>>,
    body: Result<Json<ChatTurn>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(turn) = body?;
    let reply = state
        .chat
        .handle_chat_turn(turn)
        .await
        .map_err(|e| ApiError::from_chat(CHAT_FAILED, e))?;
    Ok(Json(reply))
}
