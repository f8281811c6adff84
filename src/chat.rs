//! Chat turn orchestration: prompt assembly, the model call, and every read or
//! write the HTTP layer makes against the store.

use serde::{Deserialize, Serialize};

use crate::ai::llm::{ChatMessage, ChatModel};
use crate::db::models::{Conversation, HistoryEntry};
use crate::db::{ChatRepository, Store, StoreError};

pub const SYSTEM_INSTRUCTION: &str = "You are a psychological support assistant. Your goal is to \
     give good, empathetic and safe advice. You are a supportive helper. \
     Always answer kindly.";

/// Conversation id returned when nothing could be persisted.
pub const UNSAVED_CONVERSATION_ID: i64 = -1;
pub const UNSAVED_CONVERSATION_TITLE: &str = "DB unavailable";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("history must contain at least one message")]
    EmptyHistory,

    #[error("model call failed: {0:#}")]
    Model(anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub history: Vec<HistoryEntry>,
    pub user_id: String,
    #[serde(default)]
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub conversation_id: i64,
    pub conversation_title: String,
}

/// Map client history to a role-tagged prompt. Entries from unknown senders
/// are left out.
pub fn build_prompt(history: &[HistoryEntry]) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(SYSTEM_INSTRUCTION))
        .chain(history.iter().filter_map(|entry| match entry.sender.as_str() {
            "user" => Some(ChatMessage::user(entry.text.clone())),
            "bot" => Some(ChatMessage::assistant(entry.text.clone())),
            _ => None,
        }))
        .collect()
}

pub struct ChatService<R, M> {
    store: Store<R>,
    model: M,
}

impl<R: ChatRepository, M: ChatModel> ChatService<R, M> {
    pub fn new(store: Store<R>, model: M) -> Self {
        Self { store, model }
    }

    pub fn store(&self) -> &Store<R> {
        &self.store
    }

    pub async fn list_conversations(&self, user_id: &str) -> Vec<Conversation> {
        match self.store.list_conversations(user_id).await {
            Ok(convs) => convs,
            Err(StoreError::Unavailable) => Vec::new(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Could not list conversations");
                Vec::new()
            }
        }
    }

    pub async fn history(&self, conversation_id: i64) -> Vec<HistoryEntry> {
        match self.store.get_history(conversation_id).await {
            Ok(entries) => entries,
            Err(StoreError::Unavailable) => Vec::new(),
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "Could not read history");
                Vec::new()
            }
        }
    }

    pub async fn delete_conversation(&self, conversation_id: i64) -> Result<(), ChatError> {
        self.store.delete_conversation(conversation_id).await?;
        tracing::info!(conversation_id, "Conversation deleted");
        Ok(())
    }

    pub async fn handle_chat_turn(&self, turn: ChatTurn) -> Result<ChatReply, ChatError> {
        // The caller appends the new user utterance before sending.
        let user_text = match turn.history.last() {
            Some(entry) => entry.text.clone(),
            None => return Err(ChatError::EmptyHistory),
        };

        let prompt = build_prompt(&turn.history);
        let reply = self.model.complete(&prompt).await.map_err(ChatError::Model)?;

        if !self.store.is_enabled() {
            return Ok(ChatReply {
                reply,
                conversation_id: UNSAVED_CONVERSATION_ID,
                conversation_title: UNSAVED_CONVERSATION_TITLE.to_string(),
            });
        }

        let conv = self
            .store
            .get_or_create_conversation(turn.conversation_id, &turn.user_id, &user_text)
            .await?;

        match self.store.append_turn(conv.id, &user_text, &reply).await {
            Ok([user_msg, bot_msg]) => tracing::debug!(
                conversation_id = conv.id,
                user_message_id = user_msg.id,
                bot_message_id = bot_msg.id,
                "Turn saved"
            ),
            Err(e) => {
                tracing::warn!(conversation_id = conv.id, error = %e, "Could not save the turn");
            }
        }

        Ok(ChatReply {
            reply,
            conversation_id: conv.id,
            conversation_title: conv.title,
        })
    }
}
