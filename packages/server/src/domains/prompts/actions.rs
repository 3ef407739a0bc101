//! Prompt bot action

use serde::Serialize;

use crate::common::SessionId;
use crate::domains::prompts::questions::Topic;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Prompt {
    pub topic: String,
    pub question: &'static str,
}

/// Advance the session's counter and return the next question for `topic`.
///
/// `None` when the session is gone.
pub async fn next_question(session_id: SessionId, topic: Topic, deps: &ServerDeps) -> Option<Prompt> {
    let counter = deps
        .sessions
        .update_session(&session_id, |s| {
            s.prompt_counter = s.prompt_counter.wrapping_add(1);
            s.prompt_counter
        })
        .await?;

    Some(Prompt {
        topic: topic.to_string(),
        question: topic.question_at(counter),
    })
}
