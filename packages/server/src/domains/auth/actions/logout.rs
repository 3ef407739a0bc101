//! Logout action

use tracing::info;

use crate::common::SessionId;
use crate::domains::auth::error::AuthError;
use crate::kernel::ServerDeps;

/// Leave the waiting pool and end the session.
///
/// Pool cleanup runs first so a failed logout can simply be retried.
pub async fn logout(session_id: SessionId, deps: &ServerDeps) -> Result<(), AuthError> {
    let Some(session) = deps.sessions.get_session(&session_id).await else {
        return Err(AuthError::AuthenticationRequired);
    };

    let withdrawn = deps
        .coordinator
        .cancel(&session.email)
        .await
        .map_err(anyhow::Error::from)?;

    deps.sessions.delete_session(&session_id).await;

    info!(member_id = %session.member_id, withdrawn, "member logged out");
    Ok(())
}
