//! Postgres-backed member store

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::domains::member::models::{Member, NewMember};
use crate::kernel::BaseMemberStore;

pub struct PostgresMemberStore {
    db_pool: PgPool,
}

impl PostgresMemberStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BaseMemberStore for PostgresMemberStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        Member::find_by_email(email, &self.db_pool)
            .await
            .context("failed to look up member by email")
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>> {
        Member::find_by_username(username, &self.db_pool)
            .await
            .context("failed to look up member by username")
    }

    async fn insert(&self, member: NewMember) -> Result<Member> {
        Member::insert(&member, &self.db_pool)
            .await
            .context("failed to insert member")
    }
}
