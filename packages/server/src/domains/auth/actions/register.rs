//! Register action

use serde::Deserialize;
use tracing::info;

use crate::domains::auth::error::AuthError;
use crate::domains::auth::password::hash_password;
use crate::domains::member::models::NewMember;
use crate::domains::member::MemberData;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub party: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Free-text statements shown on the profile
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Create a member account.
///
/// E-mail is checked before username, so a request colliding on both reports
/// `EmailExists`.
pub async fn register(input: RegisterInput, deps: &ServerDeps) -> Result<MemberData, AuthError> {
    let username = input.username.trim();
    let email = input.email.trim();
    let party = input.party.trim();

    if username.is_empty() || email.is_empty() || party.is_empty() {
        return Err(AuthError::InvalidInput(
            "username, email and party are required".to_string(),
        ));
    }
    if input.password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".to_string()));
    }

    if deps.members.find_by_email(email).await?.is_some() {
        return Err(AuthError::EmailExists);
    }
    if deps.members.find_by_username(username).await?.is_some() {
        return Err(AuthError::UsernameExists);
    }

    let interests = input
        .interests
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect();

    let member = deps
        .members
        .insert(NewMember {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(&input.password)?,
            party: party.to_string(),
            avatar: input.avatar.filter(|a| !a.trim().is_empty()),
            interests,
            profile_messages: input.messages,
        })
        .await?;

    info!(member_id = %member.id, username = %member.username, "member registered");
    Ok(member.into())
}
