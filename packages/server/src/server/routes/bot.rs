use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::domains::prompts::actions::{next_question, Prompt};
use crate::domains::prompts::Topic;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

/// GET /bot/:topic
pub async fn bot_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
    Path(topic): Path<String>,
) -> Result<Json<Prompt>, ApiError> {
    let topic: Topic = topic.parse()?;
    let prompt = next_question(user.session_id, topic, &state.deps)
        .await
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(prompt))
}
