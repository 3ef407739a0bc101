//! Postgres-backed message log

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::ConversationId;
use crate::domains::chatrooms::models::ChatMessage;
use crate::kernel::BaseMessageLog;

pub struct PostgresMessageLog {
    db_pool: PgPool,
}

impl PostgresMessageLog {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BaseMessageLog for PostgresMessageLog {
    async fn append(
        &self,
        conversation_id: &ConversationId,
        username: &str,
        body: &str,
    ) -> Result<ChatMessage> {
        ChatMessage::new(conversation_id.clone(), username, body)
            .insert(&self.db_pool)
            .await
            .with_context(|| format!("failed to append to conversation {conversation_id}"))
    }

    async fn recent(&self, conversation_id: &ConversationId, limit: i64) -> Result<Vec<ChatMessage>> {
        ChatMessage::find_recent(conversation_id, limit, &self.db_pool)
            .await
            .with_context(|| format!("failed to read conversation {conversation_id}"))
    }

    async fn clear(&self, conversation_id: &ConversationId) -> Result<u64> {
        ChatMessage::delete_for_conversation(conversation_id, &self.db_pool)
            .await
            .with_context(|| format!("failed to clear conversation {conversation_id}"))
    }
}
