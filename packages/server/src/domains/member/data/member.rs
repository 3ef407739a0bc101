use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::member::models::member::Member as MemberModel;

/// Public API representation of a member (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberData {
    pub id: String,
    pub username: String,
    pub email: String,
    pub party: String,
    pub avatar: Option<String>,
    pub interests: Vec<String>,

    /// Free-text statements given at registration
    pub messages: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl From<MemberModel> for MemberData {
    fn from(member: MemberModel) -> Self {
        Self {
            id: member.id.to_string(),
            username: member.username,
            email: member.email,
            party: member.party,
            avatar: member.avatar,
            interests: member.interests,
            messages: member.profile_messages,
            created_at: member.created_at,
        }
    }
}
