use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/*
id UUID PRIMARY KEY,
phone VARCHAR(16),
firstname VARCHAR(30),
lastname VARCHAR(30),
username VARCHAR(30),
is_onboarded BOOLEAN NOT NULL DEFAULT FALSE,
avatar_public_url TEXT,
created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub phone: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
    pub is_onboarded: bool,
    pub avatar_public_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserPublic {
    pub id: Uuid,
    pub phone: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
    pub is_onboarded: bool,
    pub avatar_public_url: Option<String>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        UserPublic {
            id: user.id,
            phone: user.phone,
            firstname: user.firstname,
            lastname: user.lastname,
            username: user.username,
            is_onboarded: user.is_onboarded,
            avatar_public_url: user.avatar_public_url,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdate {
    pub phone: Option<String>,
    #[validate(length(max = 30, message = "First name must be at most 30 characters"))]
    pub firstname: Option<String>,
    #[validate(length(max = 30, message = "Last name must be at most 30 characters"))]
    pub lastname: Option<String>,
    #[validate(length(
        min = 1,
        max = 30,
        message = "Username must be between 1 and 30 characters"
    ))]
    pub username: Option<String>,
    pub is_onboarded: Option<bool>,
    pub avatar_public_url: Option<String>,
}

/// One accepted friend plus the friendship row id a client needs to unfriend.
#[derive(Debug, Serialize)]
pub struct UserWithFriendshipInfo {
    pub user: UserPublic,
    pub friendship_id: Uuid,
}
