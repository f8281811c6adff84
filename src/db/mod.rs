#[cfg(test)]
pub mod memory;
pub mod models;
pub mod store;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use store::{ChatRepository, Store, StoreError};

const INSERT_MESSAGE: &str = r#"
    INSERT INTO messages (conversation_id, sender, text)
    VALUES ($1, $2, $3)
    RETURNING id, conversation_id, sender, text, sent_at
"#;

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

/// Connect and prepare the schema. Any failure leaves the store disabled
/// instead of aborting startup.
pub async fn initialize(database_url: Option<&str>) -> Store<Database> {
    let Some(url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Persistence DISABLED.");
        return Store::Disabled;
    };

    let db = match Database::connect(url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!(error = format!("{e:#}"), "Could not connect to the database. Persistence DISABLED.");
            return Store::Disabled;
        }
    };

    if let Err(e) = db.run_migrations().await {
        tracing::warn!(error = format!("{e:#}"), "Could not prepare the schema. Persistence DISABLED.");
        return Store::Disabled;
    }

    tracing::info!("Database connected and migrations applied. Persistence enabled.");
    Store::Live(db)
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // Each CREATE must be a separate query (Postgres doesn't allow
        // multiple commands in a single prepared statement).
        // clock_timestamp() rather than NOW() so rows written in one
        // transaction still get distinct timestamps.

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS conversations (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT 'New Chat',
                created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS messages (
                id BIGSERIAL PRIMARY KEY,
                conversation_id BIGINT NOT NULL REFERENCES conversations(id),
                sender TEXT NOT NULL,
                text TEXT NOT NULL,
                sent_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_conv ON messages(conversation_id, sent_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id, created_at DESC)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl ChatRepository for Database {
    async fn list_conversations(&self, user_id: &str) -> anyhow::Result<Vec<models::Conversation>> {
        let convs = sqlx::query_as::<_, models::Conversation>(
            r#"
            SELECT id, user_id, title, created_at FROM conversations
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(convs)
    }

    async fn get_history(&self, conversation_id: i64) -> anyhow::Result<Vec<models::HistoryEntry>> {
        let entries = sqlx::query_as::<_, models::HistoryEntry>(
            r#"
            SELECT sender, text FROM messages
            WHERE conversation_id = $1
            ORDER BY sent_at ASC, id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn get_or_create_conversation(
        &self,
        conversation_id: Option<i64>,
        user_id: &str,
        seed_text: &str,
    ) -> anyhow::Result<models::Conversation> {
        // Lookup and insert share one statement. Two id-less turns racing
        // still create two conversations.
        let conv = sqlx::query_as::<_, models::Conversation>(
            r#"
            WITH existing AS (
                SELECT id, user_id, title, created_at FROM conversations
                WHERE id = $1
            ), created AS (
                INSERT INTO conversations (user_id, title)
                SELECT $2, $3
                WHERE NOT EXISTS (SELECT 1 FROM existing)
                RETURNING id, user_id, title, created_at
            )
            SELECT id, user_id, title, created_at FROM existing
            UNION ALL
            SELECT id, user_id, title, created_at FROM created
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(models::derive_title(seed_text))
        .fetch_one(&self.pool)
        .await?;
        Ok(conv)
    }

    async fn append_turn(
        &self,
        conversation_id: i64,
        user_text: &str,
        bot_text: &str,
    ) -> anyhow::Result<[models::Message; 2]> {
        let mut tx = self.pool.begin().await?;

        let user_msg = sqlx::query_as::<_, models::Message>(INSERT_MESSAGE)
            .bind(conversation_id)
            .bind("user")
            .bind(user_text)
            .fetch_one(&mut *tx)
            .await?;

        let bot_msg = sqlx::query_as::<_, models::Message>(INSERT_MESSAGE)
            .bind(conversation_id)
            .bind("bot")
            .bind(bot_text)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok([user_msg, bot_msg])
    }

    async fn delete_conversation(&self, conversation_id: i64) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
