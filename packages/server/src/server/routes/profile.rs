use axum::{extract::Extension, Json};

use crate::domains::member::MemberData;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

/// GET /profile
pub async fn profile_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
) -> Result<Json<MemberData>, ApiError> {
    let member = state
        .deps
        .members
        .find_by_email(&user.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(member.into()))
}
