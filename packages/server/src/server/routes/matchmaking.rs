//! Matchmaking routes
//!
//! POST blocks until the member is paired or the wait times out. A client
//! that disconnects mid-wait drops the handler future, which withdraws its
//! waiting entry.

use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use crate::domains::matching::actions;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

/// POST /matchmaking
pub async fn request_match_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let chat_id = actions::request_match(user.session_id, &state.deps).await?;
    Ok(Json(json!({ "chat_id": chat_id, "status_code": 200 })))
}

/// DELETE /matchmaking
pub async fn cancel_match_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let withdrawn = actions::cancel_match(user.session_id, &state.deps).await?;
    Ok(Json(json!({ "withdrawn": withdrawn, "status_code": 200 })))
}
