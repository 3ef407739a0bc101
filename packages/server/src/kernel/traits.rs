// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The matchmaking protocol, registration and chat rules live in domain code
// that is handed these traits.
//
// Naming convention: Base* for trait names (e.g., BaseWaitingPool, BaseMessageLog)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{ConversationId, EntryKey};
use crate::domains::chatrooms::models::ChatMessage;
use crate::domains::matching::error::PoolError;
use crate::domains::matching::models::{ProfileSnapshot, WaitingEntry, Withdrawal};
use crate::domains::member::models::{Member, NewMember};

// =============================================================================
// Waiting Pool Trait (Infrastructure - shared matchmaking store)
// =============================================================================

/// Shared store of members waiting for a match.
///
/// Every method is individually atomic; nothing spans several calls.
#[async_trait]
pub trait BaseWaitingPool: Send + Sync {
    /// Point-in-time snapshot of every entry, oldest first
    async fn list(&self) -> Result<Vec<WaitingEntry>, PoolError>;

    /// Add an unmatched entry for the requester.
    ///
    /// Fails with `DuplicateEntry` (carrying the live key) if the requester
    /// already has an entry.
    async fn insert(
        &self,
        requester_id: &str,
        profile: &ProfileSnapshot,
    ) -> Result<EntryKey, PoolError>;

    /// Claim an entry: set its conversation id if it is still unmatched.
    ///
    /// `NotFound` if the entry is gone, `AlreadyClaimed` if another claim won.
    async fn mark_matched(
        &self,
        key: EntryKey,
        conversation_id: &ConversationId,
    ) -> Result<(), PoolError>;

    /// Delete an entry. Removing a missing key is not an error.
    async fn remove(&self, key: EntryKey) -> Result<(), PoolError>;

    /// Point read, used for polling
    async fn get_by_key(&self, key: EntryKey) -> Result<Option<WaitingEntry>, PoolError>;

    /// Delete the entry only if nobody claimed it yet
    async fn withdraw(&self, key: EntryKey) -> Result<Withdrawal, PoolError>;

    /// Entries owned by one requester (at most one under correct operation)
    async fn find_by_requester(&self, requester_id: &str) -> Result<Vec<WaitingEntry>, PoolError>;
}

// =============================================================================
// Compatibility Predicate Trait (pure, supplied externally)
// =============================================================================

pub trait BaseCompatibility: Send + Sync {
    /// Whether the requester may be paired with the candidate.
    ///
    /// Must be pure and deterministic for given inputs.
    fn is_compatible(&self, requester: &ProfileSnapshot, candidate: &ProfileSnapshot) -> bool;
}

impl<F> BaseCompatibility for F
where
    F: Fn(&ProfileSnapshot, &ProfileSnapshot) -> bool + Send + Sync,
{
    fn is_compatible(&self, requester: &ProfileSnapshot, candidate: &ProfileSnapshot) -> bool {
        self(requester, candidate)
    }
}

// =============================================================================
// Member Store Trait (Infrastructure - user records)
// =============================================================================

#[async_trait]
pub trait BaseMemberStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>>;

    async fn insert(&self, member: NewMember) -> Result<Member>;
}

// =============================================================================
// Message Log Trait (Infrastructure - chat persistence)
// =============================================================================

#[async_trait]
pub trait BaseMessageLog: Send + Sync {
    async fn append(
        &self,
        conversation_id: &ConversationId,
        username: &str,
        body: &str,
    ) -> Result<ChatMessage>;

    /// The last `limit` messages, oldest first
    async fn recent(&self, conversation_id: &ConversationId, limit: i64)
        -> Result<Vec<ChatMessage>>;

    /// Delete the conversation's log. Returns how many messages were removed.
    async fn clear(&self, conversation_id: &ConversationId) -> Result<u64>;
}
