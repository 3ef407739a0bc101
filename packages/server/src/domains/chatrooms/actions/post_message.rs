use tracing::info;

use crate::common::{ConversationId, SessionId};
use crate::domains::chatrooms::actions::{authorize, chat_topic};
use crate::domains::chatrooms::data::MessageData;
use crate::domains::chatrooms::error::ChatError;
use crate::kernel::ServerDeps;

/// Typing this leaves the conversation
pub const EXIT_COMMAND: &str = "!exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Posted(MessageData),
    /// The poster left; their session no longer points at the conversation
    Unmatched,
}

/// Append a message to the conversation, or unmatch on `!exit`.
pub async fn post_message(
    session_id: SessionId,
    chat_id: &ConversationId,
    body: &str,
    deps: &ServerDeps,
) -> Result<PostOutcome, ChatError> {
    let session = authorize(session_id, chat_id, deps).await?;
    let topic = chat_topic(chat_id);

    if body.trim() == EXIT_COMMAND {
        deps.sessions
            .update_session(&session_id, |s| s.chat_id = None)
            .await;
        let removed = deps.messages.clear(chat_id).await?;
        deps.stream_hub
            .publish(
                &topic,
                serde_json::json!({ "type": "unmatched", "user": session.username }),
            )
            .await;

        info!(conversation_id = %chat_id, user = %session.username, removed, "member left conversation");
        return Ok(PostOutcome::Unmatched);
    }

    if body.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }

    let message = MessageData::from(deps.messages.append(chat_id, &session.username, body).await?);
    deps.stream_hub
        .publish(
            &topic,
            serde_json::json!({ "type": "message", "message": &message }),
        )
        .await;

    Ok(PostOutcome::Posted(message))
}
