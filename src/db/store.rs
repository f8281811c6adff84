use std::future::Future;

use super::models::{Conversation, HistoryEntry, Message};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store is unavailable")]
    Unavailable,

    #[error("store backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage of conversations and their messages.
pub trait ChatRepository: Send + Sync + 'static {
    /// Conversations owned by `user_id`, newest first.
    fn list_conversations(
        &self,
        user_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<Conversation>>> + Send;

    /// Messages of a conversation in the order they were written.
    fn get_history(
        &self,
        conversation_id: i64,
    ) -> impl Future<Output = anyhow::Result<Vec<HistoryEntry>>> + Send;

    /// Return the conversation `conversation_id` if it exists, otherwise create
    /// one for `user_id` titled after `seed_text`.
    fn get_or_create_conversation(
        &self,
        conversation_id: Option<i64>,
        user_id: &str,
        seed_text: &str,
    ) -> impl Future<Output = anyhow::Result<Conversation>> + Send;

    /// Store a user message followed by a bot message as one unit.
    fn append_turn(
        &self,
        conversation_id: i64,
        user_text: &str,
        bot_text: &str,
    ) -> impl Future<Output = anyhow::Result<[Message; 2]>> + Send;

    /// Remove a conversation and all of its messages as one unit.
    fn delete_conversation(
        &self,
        conversation_id: i64,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Handle to the persistence layer: either a live backend or a disabled marker
/// left behind when startup could not reach the database.
#[derive(Debug)]
pub enum Store<R> {
    Live(R),
    Disabled,
}

impl<R: ChatRepository> Store<R> {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Store::Live(_))
    }

    fn live(&self) -> StoreResult<&R> {
        match self {
            Store::Live(repo) => Ok(repo),
            Store::Disabled => Err(StoreError::Unavailable),
        }
    }

    pub async fn list_conversations(&self, user_id: &str) -> StoreResult<Vec<Conversation>> {
        Ok(self.live()?.list_conversations(user_id).await?)
    }

    pub async fn get_history(&self, conversation_id: i64) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self.live()?.get_history(conversation_id).await?)
    }

    pub async fn get_or_create_conversation(
        &self,
        conversation_id: Option<i64>,
        user_id: &str,
        seed_text: &str,
    ) -> StoreResult<Conversation> {
        Ok(self
            .live()?
            .get_or_create_conversation(conversation_id, user_id, seed_text)
            .await?)
    }

    pub async fn append_turn(
        &self,
        conversation_id: i64,
        user_text: &str,
        bot_text: &str,
    ) -> StoreResult<[Message; 2]> {
        Ok(self.live()?.append_turn(conversation_id, user_text, bot_text).await?)
    }

    pub async fn delete_conversation(&self, conversation_id: i64) -> StoreResult<()> {
        Ok(self.live()?.delete_conversation(conversation_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_message_keeps_the_cause_chain() {
        let cause = anyhow::anyhow!("password authentication failed").context("pool timed out");
        let message = StoreError::from(cause).to_string();
        assert_eq!(
            message,
            "store backend error: pool timed out: password authentication failed"
        );
    }
}
