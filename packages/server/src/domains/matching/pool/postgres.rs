use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::common::{ConversationId, EntryKey};
use crate::domains::matching::error::PoolError;
use crate::domains::matching::models::{ProfileSnapshot, WaitingEntry, WaitingEntryRow, Withdrawal};
use crate::kernel::BaseWaitingPool;

/// Waiting pool backed by the `matchmaking_entries` table.
///
/// The unique index on `requester_id` enforces one live entry per member and
/// claims are conditional updates, so concurrent servers can share it.
#[derive(Clone)]
pub struct PostgresWaitingPool {
    db_pool: PgPool,
}

impl PostgresWaitingPool {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Read back whatever is left at `key` after a conditional write missed.
    async fn current(&self, key: EntryKey) -> Result<Option<WaitingEntry>, PoolError> {
        Ok(WaitingEntryRow::find_by_key(key, &self.db_pool)
            .await?
            .map(Into::into))
    }
}

#[async_trait]
impl BaseWaitingPool for PostgresWaitingPool {
    async fn list(&self) -> Result<Vec<WaitingEntry>, PoolError> {
        let rows = WaitingEntryRow::find_all(&self.db_pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(
        &self,
        requester_id: &str,
        profile: &ProfileSnapshot,
    ) -> Result<EntryKey, PoolError> {
        if let Some(key) = WaitingEntryRow::insert(requester_id, profile, &self.db_pool).await? {
            return Ok(key);
        }

        // Lost the race against another request of the same member
        let existing = WaitingEntryRow::find_by_requester(requester_id, &self.db_pool).await?;
        match existing.first() {
            Some(row) => Err(PoolError::DuplicateEntry(row.entry_key)),
            // The conflicting entry vanished between the two statements
            None => WaitingEntryRow::insert(requester_id, profile, &self.db_pool)
                .await?
                .ok_or_else(|| anyhow::anyhow!("repeated insert conflict for requester").into()),
        }
    }

    async fn mark_matched(
        &self,
        key: EntryKey,
        conversation_id: &ConversationId,
    ) -> Result<(), PoolError> {
        if WaitingEntryRow::claim(key, conversation_id, &self.db_pool).await? {
            return Ok(());
        }

        match self.current(key).await? {
            None => Err(PoolError::NotFound(key)),
            Some(_) => Err(PoolError::AlreadyClaimed(key)),
        }
    }

    async fn remove(&self, key: EntryKey) -> Result<(), PoolError> {
        let removed = WaitingEntryRow::delete(key, &self.db_pool).await?;
        debug!(entry_key = %key, removed, "removed waiting entry");
        Ok(())
    }

    async fn get_by_key(&self, key: EntryKey) -> Result<Option<WaitingEntry>, PoolError> {
        self.current(key).await
    }

    async fn withdraw(&self, key: EntryKey) -> Result<Withdrawal, PoolError> {
        if WaitingEntryRow::delete_unmatched(key, &self.db_pool).await? == 1 {
            return Ok(Withdrawal::Removed);
        }

        Ok(match self.current(key).await? {
            None => Withdrawal::Absent,
            Some(entry) => match entry.match_result.conversation_id() {
                Some(id) => Withdrawal::AlreadyMatched(id.clone()),
                // Unreachable under atomic statements; treat as already gone
                None => Withdrawal::Absent,
            },
        })
    }

    async fn find_by_requester(&self, requester_id: &str) -> Result<Vec<WaitingEntry>, PoolError> {
        let rows = WaitingEntryRow::find_by_requester(requester_id, &self.db_pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
