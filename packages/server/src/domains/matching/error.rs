use thiserror::Error;

use crate::common::EntryKey;

/// Failures reported by a waiting pool backend
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("waiting entry {0} not found")]
    NotFound(EntryKey),

    #[error("waiting entry {0} was already claimed")]
    AlreadyClaimed(EntryKey),

    #[error("requester is already waiting as entry {0}")]
    DuplicateEntry(EntryKey),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for PoolError {
    fn from(error: sqlx::Error) -> Self {
        PoolError::Storage(error.into())
    }
}

/// Failures surfaced to callers of the coordinator
#[derive(Error, Debug)]
pub enum MatchError {
    /// Retryable: the whole request may be issued again.
    #[error("matchmaking temporarily unavailable")]
    Unavailable(#[source] PoolError),

    #[error("no match found yet, retry later")]
    NotMatchedYet,

    #[error("matchmaking request was cancelled")]
    Cancelled,

    #[error("waiting entry was withdrawn before a match arrived")]
    Withdrawn,
}

/// Failures of the session-facing matchmaking actions
#[derive(Error, Debug)]
pub enum MatchmakingError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("profile lookup failed: {0}")]
    Profile(#[source] anyhow::Error),
}
