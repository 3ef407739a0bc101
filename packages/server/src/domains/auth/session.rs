use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::{ConversationId, MemberId, SessionId};
use crate::domains::member::models::Member;

/// Per-login state kept on the server
#[derive(Clone, Debug)]
pub struct Session {
    pub member_id: MemberId,
    pub email: String,
    pub username: String,
    pub avatar: Option<String>,
    /// Conversation the member is currently matched into
    pub chat_id: Option<ConversationId>,
    /// Advances on every prompt-bot question
    pub prompt_counter: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    pub fn for_member(member: &Member) -> Self {
        Self {
            member_id: member.id,
            email: member.email.clone(),
            username: member.username.clone(),
            avatar: member.avatar.clone(),
            chat_id: None,
            prompt_counter: 0,
            created_at: chrono::Utc::now(),
        }
    }

    fn is_expired(&self, ttl: chrono::Duration, now: chrono::DateTime<chrono::Utc>) -> bool {
        now.signed_duration_since(self.created_at) >= ttl
    }
}

/// What `/loggedin` and `/login` report about a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionData {
    pub logged_in: bool,
    pub user: String,
    pub user_email: String,
    pub user_avatar: Option<String>,
    pub chat_id: Option<ConversationId>,
}

impl From<&Session> for SessionData {
    fn from(session: &Session) -> Self {
        Self {
            logged_in: true,
            user: session.username.clone(),
            user_email: session.email.clone(),
            user_avatar: session.avatar.clone(),
            chat_id: session.chat_id.clone(),
        }
    }
}

/// In-memory session store
///
/// Sessions expire `ttl` after creation (24 hours by default).
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a new session and return its id
    pub async fn create_session(&self, session: Session) -> SessionId {
        let id = SessionId::new();
        self.sessions.write().await.insert(id, session);
        id
    }

    /// Get session by id; expired sessions read as absent
    pub async fn get_session(&self, id: &SessionId) -> Option<Session> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(id)?;
        if session.is_expired(self.ttl, chrono::Utc::now()) {
            return None;
        }
        Some(session.clone())
    }

    /// Mutate a live session in place
    pub async fn update_session<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        if session.is_expired(self.ttl, chrono::Utc::now()) {
            return None;
        }
        Some(f(session))
    }

    /// Delete session (logout)
    pub async fn delete_session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Drop expired sessions. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = chrono::Utc::now();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl, now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(chrono::Duration::hours(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            member_id: MemberId::new(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            avatar: None,
            chat_id: None,
            prompt_counter: 0,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_session_creation() {
        let store = SessionStore::default();
        let id = store.create_session(session()).await;

        let retrieved = store.get_session(&id).await;
        assert_eq!(retrieved.unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_session_expiration() {
        let store = SessionStore::default();
        let mut expired = session();
        expired.created_at = chrono::Utc::now() - chrono::Duration::hours(25);

        let id = store.create_session(expired).await;
        assert!(store.get_session(&id).await.is_none(), "Expired session should return None");
        assert!(store.update_session(&id, |s| s.prompt_counter += 1).await.is_none());

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_update_session_is_visible() {
        let store = SessionStore::default();
        let id = store.create_session(session()).await;

        let chat_id = ConversationId::new("abc");
        store
            .update_session(&id, |s| s.chat_id = Some(chat_id.clone()))
            .await
            .unwrap();

        assert_eq!(store.get_session(&id).await.unwrap().chat_id, Some(chat_id));
    }

    #[tokio::test]
    async fn test_delete_session() {
        let store = SessionStore::default();
        let id = store.create_session(session()).await;

        assert!(store.delete_session(&id).await.is_some());
        assert!(store.delete_session(&id).await.is_none());
        assert!(store.get_session(&id).await.is_none());
    }
}
