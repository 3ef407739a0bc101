//! Login action

use serde::Serialize;
use tracing::{debug, info};

use crate::domains::auth::error::AuthError;
use crate::domains::auth::password::verify_password;
use crate::domains::auth::session::{Session, SessionData};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    #[serde(flatten)]
    pub session: SessionData,
}

/// Check credentials, open a session and issue a token naming it.
pub async fn login(email: &str, password: &str, deps: &ServerDeps) -> Result<LoginOutcome, AuthError> {
    let member = deps
        .members
        .find_by_email(email.trim())
        .await?
        .ok_or(AuthError::UnknownEmail)?;

    if !verify_password(password, &member.password_hash)? {
        debug!(member_id = %member.id, "login rejected: wrong password");
        return Err(AuthError::WrongPassword);
    }

    let session = Session::for_member(&member);
    let data = SessionData::from(&session);
    let session_id = deps.sessions.create_session(session).await;
    let token = deps
        .jwt_service
        .create_token(member.id, session_id, member.email.clone())?;

    info!(member_id = %member.id, session_id = %session_id, "member logged in");
    Ok(LoginOutcome {
        token,
        session: data,
    })
}
