use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::ConversationId;

/// One chat line in a conversation's log
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(conversation_id: ConversationId, username: &str, body: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            username: username.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO chat_messages (id, conversation_id, username, body, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.conversation_id)
        .bind(&self.username)
        .bind(&self.body)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Last `limit` messages of a conversation, oldest first
    pub async fn find_recent(
        conversation_id: &ConversationId,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM (
                SELECT * FROM chat_messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
             ) recent
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete_for_conversation(
        conversation_id: &ConversationId,
        pool: &PgPool,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
