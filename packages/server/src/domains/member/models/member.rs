use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::MemberId;
use crate::domains::matching::models::ProfileSnapshot;

/// Member model - SQL persistence layer
///
/// `email` is the identity used by matchmaking; `username` is what chat shows.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub username: String,
    pub email: String,
    pub password_hash: String,

    // Matching profile
    pub party: String,
    pub avatar: Option<String>,
    pub interests: Vec<String>,
    pub profile_messages: Vec<String>,

    pub created_at: DateTime<Utc>,
}

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewMember {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub party: String,
    pub avatar: Option<String>,
    pub interests: Vec<String>,
    pub profile_messages: Vec<String>,
}

impl Member {
    /// Build a member row from registration fields (used by in-memory stores)
    pub fn from_new(new: NewMember) -> Self {
        Self {
            id: MemberId::new(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            party: new.party,
            avatar: new.avatar,
            interests: new.interests,
            profile_messages: new.profile_messages,
            created_at: Utc::now(),
        }
    }

    /// The slice of the profile the compatibility predicate looks at
    pub fn profile_snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            username: self.username.clone(),
            party: self.party.clone(),
            interests: self.interests.clone(),
            avatar: self.avatar.clone(),
        }
    }

    pub async fn find_by_id(id: MemberId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_username(username: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert new member
    pub async fn insert(new: &NewMember, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO users (
                id,
                username,
                email,
                password_hash,
                party,
                avatar,
                interests,
                profile_messages
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(MemberId::new())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.party)
        .bind(&new.avatar)
        .bind(&new.interests)
        .bind(&new.profile_messages)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
