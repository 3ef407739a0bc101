//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain actions.
//! Every store sits behind a `Base*` trait so tests can inject in-memory versions.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::auth::{JwtService, SessionStore};
use crate::domains::chatrooms::PostgresMessageLog;
use crate::domains::matching::{
    MatchCoordinator, MatchmakingConfig, OpposingViewsCompatibility, PostgresWaitingPool,
};
use crate::domains::member::PostgresMemberStore;
use crate::kernel::{stream_hub::StreamHub, BaseMemberStore, BaseMessageLog};

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    pub members: Arc<dyn BaseMemberStore>,
    pub messages: Arc<dyn BaseMessageLog>,
    /// Pairing protocol over the shared waiting pool
    pub coordinator: Arc<MatchCoordinator>,
    /// Server-side session state (chat id, prompt counter)
    pub sessions: Arc<SessionStore>,
    /// JWT service for token creation
    pub jwt_service: Arc<JwtService>,
    /// In-process pub/sub hub for match wake-ups and chat SSE
    pub stream_hub: StreamHub,
}

impl ServerDeps {
    pub fn new(
        members: Arc<dyn BaseMemberStore>,
        messages: Arc<dyn BaseMessageLog>,
        coordinator: Arc<MatchCoordinator>,
        sessions: Arc<SessionStore>,
        jwt_service: Arc<JwtService>,
        stream_hub: StreamHub,
    ) -> Self {
        Self {
            members,
            messages,
            coordinator,
            sessions,
            jwt_service,
            stream_hub,
        }
    }

    /// Production wiring: every store on the same Postgres pool
    pub fn postgres(
        db_pool: PgPool,
        jwt_service: JwtService,
        sessions: SessionStore,
        matchmaking: MatchmakingConfig,
    ) -> Self {
        let stream_hub = StreamHub::new();
        let coordinator = MatchCoordinator::new(
            Arc::new(PostgresWaitingPool::new(db_pool.clone())),
            Arc::new(OpposingViewsCompatibility),
            stream_hub.clone(),
            matchmaking,
        );

        Self::new(
            Arc::new(PostgresMemberStore::new(db_pool.clone())),
            Arc::new(PostgresMessageLog::new(db_pool)),
            Arc::new(coordinator),
            Arc::new(sessions),
            Arc::new(jwt_service),
            stream_hub,
        )
    }
}
