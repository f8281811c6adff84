//! In-process [`ChatRepository`] used by the unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use super::models::{derive_title, Conversation, HistoryEntry, Message};
use super::store::ChatRepository;

#[derive(Debug, Default)]
struct Tables {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    next_conversation_id: i64,
    next_message_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    failing_appends: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the backend went away.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make only `append_turn` fail, leaving reads and conversation creation working.
    pub fn set_failing_appends(&self, failing: bool) {
        self.failing_appends.store(failing, Ordering::SeqCst);
    }

    pub fn conversation_count(&self) -> usize {
        self.tables.lock().unwrap().conversations.len()
    }

    pub fn message_count(&self, conversation_id: i64) -> usize {
        self.tables
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .count()
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

impl ChatRepository for MemoryRepository {
    async fn list_conversations(&self, user_id: &str) -> anyhow::Result<Vec<Conversation>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut convs: Vec<Conversation> = tables
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        convs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(convs)
    }

    async fn get_history(&self, conversation_id: i64) -> anyhow::Result<Vec<HistoryEntry>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut msgs: Vec<&Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect();
        msgs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(msgs.into_iter().cloned().map(HistoryEntry::from).collect())
    }

    async fn get_or_create_conversation(
        &self,
        conversation_id: Option<i64>,
        user_id: &str,
        seed_text: &str,
    ) -> anyhow::Result<Conversation> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = conversation_id
            .and_then(|id| tables.conversations.iter().find(|c| c.id == id))
        {
            return Ok(existing.clone());
        }

        tables.next_conversation_id += 1;
        let conv = Conversation {
            id: tables.next_conversation_id,
            user_id: user_id.to_string(),
            title: derive_title(seed_text),
            created_at: Utc::now(),
        };
        tables.conversations.push(conv.clone());
        Ok(conv)
    }

    async fn append_turn(
        &self,
        conversation_id: i64,
        user_text: &str,
        bot_text: &str,
    ) -> anyhow::Result<[Message; 2]> {
        self.check()?;
        if self.failing_appends.load(Ordering::SeqCst) {
            anyhow::bail!("deadlock detected");
        }
        let mut tables = self.tables.lock().unwrap();
        if !tables.conversations.iter().any(|c| c.id == conversation_id) {
            anyhow::bail!("conversation {} does not exist", conversation_id);
        }

        let mut make = |sender: &str, text: &str| {
            tables.next_message_id += 1;
            Message {
                id: tables.next_message_id,
                conversation_id,
                sender: sender.to_string(),
                text: text.to_string(),
                timestamp: Utc::now(),
            }
        };
        let pair = [make("user", user_text), make("bot", bot_text)];
        tables.messages.extend(pair.iter().cloned());
        Ok(pair)
    }

    async fn delete_conversation(&self, conversation_id: i64) -> anyhow::Result<()> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        tables.messages.retain(|m| m.conversation_id != conversation_id);
        tables.conversations.retain(|c| c.id != conversation_id);
        Ok(())
    }
}
