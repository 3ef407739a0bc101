use crate::common::{MemberId, SessionId};
use crate::domains::auth::{Claims, JwtService, SessionStore};
use crate::server::error::ApiError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Authenticated session from a verified JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub session_id: SessionId,
    pub member_id: MemberId,
    pub email: String,
}

/// JWT authentication middleware
///
/// Extracts JWT token from Authorization header, verifies it, checks that the
/// session it names is still live, and adds AuthUser to request extensions.
/// If no token, invalid token, or ended session, request continues without
/// AuthUser (public access).
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    sessions: Arc<SessionStore>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = match extract_claims(request.headers(), &jwt_service) {
        Some(claims) => authenticate(claims, &sessions).await,
        None => None,
    };

    if let Some(user) = auth_user {
        debug!(member_id = %user.member_id, session_id = %user.session_id, "authenticated request");
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from headers
pub(crate) fn extract_claims(headers: &HeaderMap, jwt_service: &JwtService) -> Option<Claims> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;

    // Extract token (handle both "Bearer <token>" and raw token)
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    jwt_service.verify_token(token).ok()
}

/// Resolve claims to a live session
pub(crate) async fn authenticate(claims: Claims, sessions: &SessionStore) -> Option<AuthUser> {
    let session = sessions.get_session(&claims.sid).await?;
    Some(AuthUser {
        session_id: claims.sid,
        member_id: session.member_id,
        email: session.email,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}
