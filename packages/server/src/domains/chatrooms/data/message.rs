use serde::{Deserialize, Serialize};

use crate::domains::chatrooms::models::ChatMessage;

/// Chat line as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageData {
    pub user: String,
    pub message: String,
    /// Milliseconds since the epoch
    pub time: i64,
}

impl From<ChatMessage> for MessageData {
    fn from(m: ChatMessage) -> Self {
        Self {
            user: m.username,
            message: m.body,
            time: m.created_at.timestamp_millis(),
        }
    }
}
