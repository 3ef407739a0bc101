// TestDependencies - in-memory implementations for testing
//
// Provides stores that can be injected into ServerDeps so actions and the
// HTTP router run without Postgres.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{BaseCompatibility, BaseMemberStore, BaseMessageLog, ServerDeps, StreamHub};
use crate::common::ConversationId;
use crate::domains::auth::{JwtService, SessionStore};
use crate::domains::chatrooms::models::ChatMessage;
use crate::domains::matching::{
    InMemoryWaitingPool, MatchCoordinator, MatchmakingConfig, OpposingViewsCompatibility,
};
use crate::domains::member::models::{Member, NewMember};

// =============================================================================
// In-memory Member Store
// =============================================================================

/// Enforces the same unique e-mail / username rule as the `users` table
#[derive(Default)]
pub struct InMemoryMemberStore {
    members: RwLock<Vec<Member>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.members.read().await.len()
    }
}

#[async_trait]
impl BaseMemberStore for InMemoryMemberStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.iter().find(|m| m.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.iter().find(|m| m.username == username).cloned())
    }

    async fn insert(&self, member: NewMember) -> Result<Member> {
        let mut members = self.members.write().await;
        if members
            .iter()
            .any(|m| m.email == member.email || m.username == member.username)
        {
            bail!("duplicate member {}", member.email);
        }
        let member = Member::from_new(member);
        members.push(member.clone());
        Ok(member)
    }
}

// =============================================================================
// In-memory Message Log
// =============================================================================

#[derive(Default)]
pub struct InMemoryMessageLog {
    messages: RwLock<Vec<ChatMessage>>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored message of a conversation, oldest first
    pub async fn all(&self, conversation_id: &ConversationId) -> Vec<ChatMessage> {
        let messages = self.messages.read().await;
        messages
            .iter()
            .filter(|m| &m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BaseMessageLog for InMemoryMessageLog {
    async fn append(
        &self,
        conversation_id: &ConversationId,
        username: &str,
        body: &str,
    ) -> Result<ChatMessage> {
        let message = ChatMessage::new(conversation_id.clone(), username, body);
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn recent(&self, conversation_id: &ConversationId, limit: i64) -> Result<Vec<ChatMessage>> {
        let all = self.all(conversation_id).await;
        let keep = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let skip = all.len().saturating_sub(keep);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn clear(&self, conversation_id: &ConversationId) -> Result<u64> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| &m.conversation_id != conversation_id);
        Ok((before - messages.len()) as u64)
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Matchmaking timings short enough for tests
pub fn fast_matchmaking() -> MatchmakingConfig {
    MatchmakingConfig {
        match_timeout: Duration::from_millis(500),
        poll_min_interval: Duration::from_millis(5),
        poll_max_interval: Duration::from_millis(50),
    }
}

pub struct TestDependencies {
    pub members: Arc<InMemoryMemberStore>,
    pub messages: Arc<InMemoryMessageLog>,
    pub pool: InMemoryWaitingPool,
    pub compatibility: Arc<dyn BaseCompatibility>,
    pub matchmaking: MatchmakingConfig,
    pub sessions: Arc<SessionStore>,
    pub jwt_service: Arc<JwtService>,
    pub stream_hub: StreamHub,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            members: Arc::new(InMemoryMemberStore::new()),
            messages: Arc::new(InMemoryMessageLog::new()),
            pool: InMemoryWaitingPool::new(),
            compatibility: Arc::new(OpposingViewsCompatibility),
            matchmaking: fast_matchmaking(),
            sessions: Arc::new(SessionStore::default()),
            jwt_service: Arc::new(JwtService::new("test_secret", "test_issuer".to_string())),
            stream_hub: StreamHub::new(),
        }
    }

    /// Replace the pairing rule
    pub fn compatibility(mut self, rule: impl BaseCompatibility + 'static) -> Self {
        self.compatibility = Arc::new(rule);
        self
    }

    /// Replace matchmaking timings
    pub fn matchmaking(mut self, config: MatchmakingConfig) -> Self {
        self.matchmaking = config;
        self
    }

    /// Convert into ServerDeps sharing these stores
    pub fn server_deps(&self) -> ServerDeps {
        let coordinator = MatchCoordinator::new(
            Arc::new(self.pool.clone()),
            self.compatibility.clone(),
            self.stream_hub.clone(),
            self.matchmaking.clone(),
        );

        ServerDeps::new(
            self.members.clone(),
            self.messages.clone(),
            Arc::new(coordinator),
            self.sessions.clone(),
            self.jwt_service.clone(),
            self.stream_hub.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
