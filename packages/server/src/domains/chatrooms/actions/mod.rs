//! Chat actions - reading and posting to a matched conversation

mod chat_log;
mod post_message;

pub use chat_log::{chat_log, CHAT_LOG_LIMIT};
pub use post_message::{post_message, PostOutcome, EXIT_COMMAND};

use crate::common::{ConversationId, SessionId};
use crate::domains::auth::Session;
use crate::domains::chatrooms::error::ChatError;
use crate::kernel::ServerDeps;

/// Hub topic carrying a conversation's live messages
pub fn chat_topic(chat_id: &ConversationId) -> String {
    format!("chat:{chat_id}")
}

/// Only the session currently matched into `chat_id` may use it.
pub async fn authorize(
    session_id: SessionId,
    chat_id: &ConversationId,
    deps: &ServerDeps,
) -> Result<Session, ChatError> {
    let session = deps
        .sessions
        .get_session(&session_id)
        .await
        .ok_or(ChatError::NotSignedIn)?;

    if session.chat_id.as_ref() != Some(chat_id) {
        return Err(ChatError::NotParticipant);
    }
    Ok(session)
}
