use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::ConversationId;
use crate::domains::chatrooms::actions::{self, PostOutcome};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub msg: String,
}

/// GET /chatid
pub async fn chat_id_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let chat_id = state
        .deps
        .sessions
        .get_session(&user.session_id)
        .await
        .ok_or(ApiError::Unauthorized)?
        .chat_id
        .ok_or(ApiError::NotMatched)?;

    Ok(Json(json!({ "chat_id": chat_id, "status_code": 200 })))
}

/// POST /chat/:chat_id
pub async fn post_message_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let chat_id = ConversationId::new(chat_id);
    let outcome = actions::post_message(user.session_id, &chat_id, &request.msg, &state.deps).await?;

    Ok(Json(match outcome {
        PostOutcome::Posted(message) => json!({ "message": message, "status_code": 200 }),
        PostOutcome::Unmatched => json!({ "unmatched": true, "status_code": 200 }),
    }))
}

/// GET /chat/log/:chat_id
pub async fn chat_log_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let messages = actions::chat_log(user.session_id, &ConversationId::new(chat_id), &state.deps).await?;
    Ok(Json(json!({ "result": messages, "status_code": 200 })))
}
