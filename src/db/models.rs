use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_TITLE: &str = "New Chat";
pub const TITLE_MAX_CHARS: usize = 50;
pub const TITLE_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender: String,
    pub text: String,
    #[sqlx(rename = "sent_at")]
    pub timestamp: DateTime<Utc>,
}

/// One turn entry as exchanged with clients: who said it and what was said.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self { sender: sender.into(), text: text.into() }
    }
}

impl From<Message> for HistoryEntry {
    fn from(msg: Message) -> Self {
        Self { sender: msg.sender, text: msg.text }
    }
}

/// Conversation title derived from the first user message.
pub fn derive_title(seed_text: &str) -> String {
    if seed_text.trim().is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    match seed_text.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &seed_text[..cut], TITLE_ELLIPSIS),
        None => seed_text.to_string(),
    }
}
