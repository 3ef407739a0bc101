//! Account and session routes

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domains::auth::actions::{self, LoginOutcome, RegisterInput};
use crate::domains::auth::SessionData;
use crate::domains::member::MemberData;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /register
pub async fn register_handler(
    Extension(state): Extension<AxumAppState>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<MemberData>, ApiError> {
    let member = actions::register(input, &state.deps).await?;
    Ok(Json(member))
}

/// POST /login
pub async fn login_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, ApiError> {
    let outcome = actions::login(&request.email, &request.password, &state.deps).await?;
    Ok(Json(outcome))
}

/// POST /logout
pub async fn logout_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    actions::logout(user.session_id, &state.deps).await?;
    Ok(Json(json!({ "status_code": 200 })))
}

/// GET /loggedin
pub async fn logged_in_handler(
    Extension(state): Extension<AxumAppState>,
    user: Option<AuthUser>,
) -> Json<Value> {
    let session = match user {
        Some(user) => state.deps.sessions.get_session(&user.session_id).await,
        None => None,
    };

    match session {
        Some(session) => Json(json!(SessionData::from(&session))),
        None => Json(json!({ "logged_in": false })),
    }
}
