use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::users::{User, UserUpdate},
};

pub async fn get_all_users(conn: &mut PgConnection) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
        .fetch_all(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (get_all_users): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching users"))
        })?;

    Ok(users)
}

pub async fn find_user_by_id(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (find_user_by_id): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching user"))
        })?;

    Ok(user)
}

/// Lookup used to reconcile an external invitee's phone number against
/// registered users. Phone numbers are stored normalized, so a plain
/// equality match is enough.
pub async fn find_user_by_phone(conn: &mut PgConnection, phone: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = $1")
        .bind(phone)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (find_user_by_phone): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching user"))
        })?;

    Ok(user)
}

/// Partial update: only supplied fields overwrite existing ones.
/// The phone has already been normalized by the handler.
pub async fn update_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    update: &UserUpdate,
    normalized_phone: Option<String>,
) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users
         SET phone = COALESCE($2, phone),
             firstname = COALESCE($3, firstname),
             lastname = COALESCE($4, lastname),
             username = COALESCE($5, username),
             is_onboarded = COALESCE($6, is_onboarded),
             avatar_public_url = COALESCE($7, avatar_public_url),
             updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(user_id)
    .bind(normalized_phone)
    .bind(update.firstname.as_deref())
    .bind(update.lastname.as_deref())
    .bind(update.username.as_deref())
    .bind(update.is_onboarded)
    .bind(update.avatar_public_url.as_deref())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
        _ => {
            tracing::error!("Database update error (update_user): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error updating user"))
        }
    })?;

    Ok(user)
}
