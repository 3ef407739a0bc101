use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::{ConversationId, EntryKey};
use crate::domains::matching::error::PoolError;
use crate::domains::matching::models::{MatchResult, ProfileSnapshot, WaitingEntry, Withdrawal};
use crate::kernel::BaseWaitingPool;

/// In-process waiting pool.
///
/// Each operation takes the lock once, which gives the same per-operation
/// atomicity the Postgres backend gets from single statements. Entries are
/// kept in insertion order. Used by tests and single-instance deployments.
#[derive(Clone, Default)]
pub struct InMemoryWaitingPool {
    entries: Arc<RwLock<Vec<WaitingEntry>>>,
}

impl InMemoryWaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl BaseWaitingPool for InMemoryWaitingPool {
    async fn list(&self) -> Result<Vec<WaitingEntry>, PoolError> {
        Ok(self.entries.read().await.clone())
    }

    async fn insert(
        &self,
        requester_id: &str,
        profile: &ProfileSnapshot,
    ) -> Result<EntryKey, PoolError> {
        let mut entries = self.entries.write().await;

        if let Some(existing) = entries.iter().find(|e| e.requester_id == requester_id) {
            return Err(PoolError::DuplicateEntry(existing.entry_key));
        }

        let key = EntryKey::new();
        entries.push(WaitingEntry {
            entry_key: key,
            requester_id: requester_id.to_string(),
            profile: profile.clone(),
            match_result: MatchResult::Unmatched,
            created_at: Utc::now(),
        });
        Ok(key)
    }

    async fn mark_matched(
        &self,
        key: EntryKey,
        conversation_id: &ConversationId,
    ) -> Result<(), PoolError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.entry_key == key)
            .ok_or(PoolError::NotFound(key))?;

        if entry.match_result.is_matched() {
            return Err(PoolError::AlreadyClaimed(key));
        }
        entry.match_result = MatchResult::Matched(conversation_id.clone());
        Ok(())
    }

    async fn remove(&self, key: EntryKey) -> Result<(), PoolError> {
        self.entries.write().await.retain(|e| e.entry_key != key);
        Ok(())
    }

    async fn get_by_key(&self, key: EntryKey) -> Result<Option<WaitingEntry>, PoolError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.entry_key == key).cloned())
    }

    async fn withdraw(&self, key: EntryKey) -> Result<Withdrawal, PoolError> {
        let mut entries = self.entries.write().await;

        let Some(index) = entries.iter().position(|e| e.entry_key == key) else {
            return Ok(Withdrawal::Absent);
        };

        if let Some(conversation_id) = entries[index].match_result.conversation_id() {
            return Ok(Withdrawal::AlreadyMatched(conversation_id.clone()));
        }
        entries.remove(index);
        Ok(Withdrawal::Removed)
    }

    async fn find_by_requester(&self, requester_id: &str) -> Result<Vec<WaitingEntry>, PoolError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.requester_id == requester_id)
            .cloned()
            .collect())
    }
}
