use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::common::{ConversationId, EntryKey};

/// Profile fields the compatibility predicate looks at.
///
/// Copied into the pool when a member starts waiting, so candidates can be
/// evaluated without a second lookup in the member store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub username: String,
    pub party: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Outcome slot of a waiting entry. Written once, by the claiming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "conversation_id", rename_all = "snake_case")]
pub enum MatchResult {
    Unmatched,
    Matched(ConversationId),
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            MatchResult::Matched(id) => Some(id),
            MatchResult::Unmatched => None,
        }
    }
}

impl From<Option<ConversationId>> for MatchResult {
    fn from(value: Option<ConversationId>) -> Self {
        value.map_or(MatchResult::Unmatched, MatchResult::Matched)
    }
}

/// One member currently waiting in the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingEntry {
    pub entry_key: EntryKey,
    /// Requester identity (the member's e-mail)
    pub requester_id: String,
    pub profile: ProfileSnapshot,
    pub match_result: MatchResult,
    pub created_at: DateTime<Utc>,
}

/// Result of removing an entry only if nobody has claimed it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Withdrawal {
    Removed,
    Absent,
    AlreadyMatched(ConversationId),
}

/// Waiting entry - SQL persistence layer
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct WaitingEntryRow {
    pub entry_key: EntryKey,
    pub requester_id: String,
    pub profile: Json<ProfileSnapshot>,
    pub conversation_id: Option<ConversationId>,
    pub created_at: DateTime<Utc>,
}

impl From<WaitingEntryRow> for WaitingEntry {
    fn from(row: WaitingEntryRow) -> Self {
        Self {
            entry_key: row.entry_key,
            requester_id: row.requester_id,
            profile: row.profile.0,
            match_result: row.conversation_id.into(),
            created_at: row.created_at,
        }
    }
}

impl WaitingEntryRow {
    /// All entries, oldest first
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM matchmaking_entries ORDER BY created_at ASC, entry_key ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_key(key: EntryKey, pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM matchmaking_entries WHERE entry_key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_requester(
        requester_id: &str,
        pool: &PgPool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM matchmaking_entries WHERE requester_id = $1")
            .bind(requester_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a new unmatched entry.
    ///
    /// Returns None when the requester already has a live entry
    /// (unique index on requester_id).
    pub async fn insert(
        requester_id: &str,
        profile: &ProfileSnapshot,
        pool: &PgPool,
    ) -> Result<Option<EntryKey>, sqlx::Error> {
        sqlx::query_scalar::<_, EntryKey>(
            "INSERT INTO matchmaking_entries (entry_key, requester_id, profile)
             VALUES ($1, $2, $3)
             ON CONFLICT (requester_id) DO NOTHING
             RETURNING entry_key",
        )
        .bind(EntryKey::new())
        .bind(requester_id)
        .bind(Json(profile))
        .fetch_optional(pool)
        .await
    }

    /// Set the conversation id only if the entry is still unmatched.
    ///
    /// Returns true when this call performed the claim.
    pub async fn claim(
        key: EntryKey,
        conversation_id: &ConversationId,
        pool: &PgPool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE matchmaking_entries
             SET conversation_id = $2
             WHERE entry_key = $1
               AND conversation_id IS NULL",
        )
        .bind(key)
        .bind(conversation_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(key: EntryKey, pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM matchmaking_entries WHERE entry_key = $1")
            .bind(key)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete the entry only if it is still unmatched. Returns rows affected.
    pub async fn delete_unmatched(key: EntryKey, pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM matchmaking_entries
             WHERE entry_key = $1
               AND conversation_id IS NULL",
        )
        .bind(key)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_from_nullable_column() {
        assert_eq!(MatchResult::from(None), MatchResult::Unmatched);

        let id = ConversationId::new("c1");
        let matched = MatchResult::from(Some(id.clone()));
        assert!(matched.is_matched());
        assert_eq!(matched.conversation_id(), Some(&id));
    }

    #[test]
    fn test_profile_snapshot_defaults_optional_fields() {
        let profile: ProfileSnapshot =
            serde_json::from_str(r#"{"username": "sam", "party": "green"}"#).unwrap();
        assert!(profile.interests.is_empty());
        assert!(profile.avatar.is_none());
    }
}
