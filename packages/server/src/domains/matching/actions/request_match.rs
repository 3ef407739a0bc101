use tracing::{info, warn};

use crate::common::{ConversationId, SessionId};
use crate::domains::chatrooms::actions::chat_topic;
use crate::domains::matching::error::MatchmakingError;
use crate::kernel::ServerDeps;

/// Pair the session's member and remember the conversation in the session.
///
/// Blocks until matched, timed out, or cancelled. If the session ended while
/// waiting, the partner is told over the chat topic and the caller gets
/// `NotSignedIn`.
pub async fn request_match(
    session_id: SessionId,
    deps: &ServerDeps,
) -> Result<ConversationId, MatchmakingError> {
    let session = deps
        .sessions
        .get_session(&session_id)
        .await
        .ok_or(MatchmakingError::NotSignedIn)?;

    let member = deps
        .members
        .find_by_email(&session.email)
        .await
        .map_err(MatchmakingError::Profile)?
        .ok_or_else(|| {
            MatchmakingError::Profile(anyhow::anyhow!("member {} no longer exists", session.email))
        })?;

    let conversation_id = deps
        .coordinator
        .request_match(&session.email, &member.profile_snapshot())
        .await?;

    let recorded = deps
        .sessions
        .update_session(&session_id, |s| s.chat_id = Some(conversation_id.clone()))
        .await;
    if recorded.is_none() {
        // The claim is spent; release the partner instead of leaving them alone
        warn!(
            member_id = %member.id,
            conversation_id = %conversation_id,
            "session ended while waiting for a match"
        );
        deps.stream_hub
            .publish(
                &chat_topic(&conversation_id),
                serde_json::json!({ "type": "unmatched", "user": member.username }),
            )
            .await;
        return Err(MatchmakingError::NotSignedIn);
    }

    info!(member_id = %member.id, conversation_id = %conversation_id, "session matched");
    Ok(conversation_id)
}
