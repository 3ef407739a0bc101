use crate::common::{ConversationId, SessionId};
use crate::domains::chatrooms::actions::authorize;
use crate::domains::chatrooms::data::MessageData;
use crate::domains::chatrooms::error::ChatError;
use crate::kernel::ServerDeps;

/// How many messages a log read returns
pub const CHAT_LOG_LIMIT: i64 = 10;

/// The most recent messages, oldest first.
pub async fn chat_log(
    session_id: SessionId,
    chat_id: &ConversationId,
    deps: &ServerDeps,
) -> Result<Vec<MessageData>, ChatError> {
    authorize(session_id, chat_id, deps).await?;

    let messages = deps.messages.recent(chat_id, CHAT_LOG_LIMIT).await?;
    Ok(messages.into_iter().map(MessageData::from).collect())
}
