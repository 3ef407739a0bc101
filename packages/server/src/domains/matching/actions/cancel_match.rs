use crate::common::SessionId;
use crate::domains::matching::error::MatchmakingError;
use crate::kernel::ServerDeps;

/// Stop the session's pending matchmaking. Returns how many entries were withdrawn.
pub async fn cancel_match(session_id: SessionId, deps: &ServerDeps) -> Result<usize, MatchmakingError> {
    let session = deps
        .sessions
        .get_session(&session_id)
        .await
        .ok_or(MatchmakingError::NotSignedIn)?;

    Ok(deps.coordinator.cancel(&session.email).await?)
}
