use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        friendships::{FriendRequestType, Friendship, FriendshipPublic, FriendshipStatus},
        users::UserPublic,
    },
};

/// Match the unordered pair the same way the `unique_friendship_pair`
/// index does, so the friendly check and the constraint agree.
pub async fn find_friendship_for_pair(
    conn: &mut PgConnection,
    user_a: Uuid,
    user_b: Uuid,
) -> AppResult<Option<Friendship>> {
    let friendship = sqlx::query_as::<_, Friendship>(
        "SELECT * FROM friendships
         WHERE LEAST(requester_id, addressee_id) = LEAST($1, $2)
           AND GREATEST(requester_id, addressee_id) = GREATEST($1, $2)",
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database query error (find_friendship_for_pair): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error fetching friendship"))
    })?;

    Ok(friendship)
}

pub async fn find_friendship(
    conn: &mut PgConnection,
    friendship_id: Uuid,
) -> AppResult<Option<Friendship>> {
    let friendship = sqlx::query_as::<_, Friendship>("SELECT * FROM friendships WHERE id = $1")
        .bind(friendship_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (find_friendship): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching friendship"))
        })?;

    Ok(friendship)
}

pub async fn insert_friendship(
    conn: &mut PgConnection,
    requester_id: Uuid,
    addressee_id: Uuid,
) -> AppResult<Friendship> {
    let friendship = sqlx::query_as::<_, Friendship>(
        "INSERT INTO friendships (id, requester_id, addressee_id, status)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(requester_id)
    .bind(addressee_id)
    .bind(FriendshipStatus::Pending)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        // Two concurrent requests can both pass the existence check;
        // the unique pair index catches the loser and we report 409.
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict(anyhow::anyhow!(
                    "A friendship already exists between these users"
                ));
            }
        }
        tracing::error!("Database insert error (insert_friendship): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error creating friend request"))
    })?;

    Ok(friendship)
}

pub async fn update_friendship_status(
    conn: &mut PgConnection,
    friendship_id: Uuid,
    status: FriendshipStatus,
) -> AppResult<Friendship> {
    let friendship = sqlx::query_as::<_, Friendship>(
        "UPDATE friendships SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(friendship_id)
    .bind(status)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound(anyhow::anyhow!("Friendship not found")),
        _ => {
            tracing::error!("Database update error (update_friendship_status): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error updating friendship"))
        }
    })?;

    Ok(friendship)
}

pub async fn delete_friendship(conn: &mut PgConnection, friendship_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM friendships WHERE id = $1")
        .bind(friendship_id)
        .execute(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database delete error (delete_friendship): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error deleting friendship"))
        })?;

    Ok(())
}

/// One accepted friend: the friendship row id plus the other user's columns.
#[derive(Debug, sqlx::FromRow)]
pub struct FriendRow {
    pub friendship_id: Uuid,
    #[sqlx(flatten)]
    pub user: UserPublic,
}

pub async fn get_accepted_friends(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> AppResult<Vec<FriendRow>> {
    let friends = sqlx::query_as::<_, FriendRow>(
        "SELECT f.id AS friendship_id,
                u.id, u.phone, u.firstname, u.lastname, u.username,
                u.is_onboarded, u.avatar_public_url
         FROM friendships f
         JOIN users u
           ON u.id = CASE WHEN f.requester_id = $1 THEN f.addressee_id ELSE f.requester_id END
         WHERE (f.requester_id = $1 OR f.addressee_id = $1)
           AND f.status = $2",
    )
    .bind(user_id)
    .bind(FriendshipStatus::Accepted)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database query error (get_accepted_friends): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error fetching friends"))
    })?;

    Ok(friends)
}

/// A pending request joined with both participants.
#[derive(Debug, sqlx::FromRow)]
pub struct FriendRequestRow {
    pub id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub r_id: Uuid,
    pub r_phone: Option<String>,
    pub r_firstname: Option<String>,
    pub r_lastname: Option<String>,
    pub r_username: Option<String>,
    pub r_is_onboarded: bool,
    pub r_avatar_public_url: Option<String>,
    pub a_id: Uuid,
    pub a_phone: Option<String>,
    pub a_firstname: Option<String>,
    pub a_lastname: Option<String>,
    pub a_username: Option<String>,
    pub a_is_onboarded: bool,
    pub a_avatar_public_url: Option<String>,
}

impl From<FriendRequestRow> for FriendshipPublic {
    fn from(row: FriendRequestRow) -> Self {
        FriendshipPublic {
            id: row.id,
            status: row.status,
            created_at: row.created_at,
            requester: UserPublic {
                id: row.r_id,
                phone: row.r_phone,
                firstname: row.r_firstname,
                lastname: row.r_lastname,
                username: row.r_username,
                is_onboarded: row.r_is_onboarded,
                avatar_public_url: row.r_avatar_public_url,
            },
            addressee: UserPublic {
                id: row.a_id,
                phone: row.a_phone,
                firstname: row.a_firstname,
                lastname: row.a_lastname,
                username: row.a_username,
                is_onboarded: row.a_is_onboarded,
                avatar_public_url: row.a_avatar_public_url,
            },
        }
    }
}

pub async fn get_pending_requests(
    conn: &mut PgConnection,
    user_id: Uuid,
    request_type: Option<FriendRequestType>,
) -> AppResult<Vec<FriendRequestRow>> {
    let involvement = match request_type {
        Some(FriendRequestType::Outgoing) => "f.requester_id = $1",
        Some(FriendRequestType::Incoming) => "f.addressee_id = $1",
        None => "(f.requester_id = $1 OR f.addressee_id = $1)",
    };
    let query = format!(
        "SELECT f.id, f.status, f.created_at,
                r.id AS r_id, r.phone AS r_phone, r.firstname AS r_firstname,
                r.lastname AS r_lastname, r.username AS r_username,
                r.is_onboarded AS r_is_onboarded, r.avatar_public_url AS r_avatar_public_url,
                a.id AS a_id, a.phone AS a_phone, a.firstname AS a_firstname,
                a.lastname AS a_lastname, a.username AS a_username,
                a.is_onboarded AS a_is_onboarded, a.avatar_public_url AS a_avatar_public_url
         FROM friendships f
         JOIN users r ON r.id = f.requester_id
         JOIN users a ON a.id = f.addressee_id
         WHERE {involvement} AND f.status = $2
         ORDER BY f.created_at DESC"
    );

    let requests = sqlx::query_as::<_, FriendRequestRow>(&query)
        .bind(user_id)
        .bind(FriendshipStatus::Pending)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (get_pending_requests): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!(
                "Database error fetching friend requests"
            ))
        })?;

    Ok(requests)
}
