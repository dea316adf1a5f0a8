use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::users::UserPublic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "friendship_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestType {
    Outgoing,
    Incoming,
}

/*
id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
requester_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
addressee_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
status friendship_status NOT NULL DEFAULT 'pending',
created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
CHECK (requester_id <> addressee_id)

-- one row per unordered pair regardless of direction:
CREATE UNIQUE INDEX unique_friendship_pair
ON friendships (LEAST(requester_id, addressee_id), GREATEST(requester_id, addressee_id));
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FriendshipCreate {
    pub addressee_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FriendshipUpdate {
    pub status: FriendshipStatus,
}

#[derive(Debug, Serialize)]
pub struct FriendshipPublic {
    pub id: Uuid,
    pub requester: UserPublic,
    pub addressee: UserPublic,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}
