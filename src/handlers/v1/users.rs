use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    middlewares::auth::AuthUser,
    models::{
        dto::Dto,
        users::{UserPublic, UserUpdate},
    },
    queries::users::{find_user_by_id, get_all_users, update_user},
    utils::phone::normalize_phone,
};

pub async fn get_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let users = get_all_users(&mut conn).await?;
    let users: Vec<UserPublic> = users.into_iter().map(UserPublic::from).collect();

    Ok((axum::http::StatusCode::OK, Json(Dto { data: users })))
}

pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let user = find_user_by_id(&mut conn, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("User not found with ID: {}", user_id)))?;

    Ok((
        axum::http::StatusCode::OK,
        Json(Dto {
            data: UserPublic::from(user),
        }),
    ))
}

pub async fn patch_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(mut payload): Json<UserUpdate>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid user data: {}", e)))?;

    // Users can only edit their own profile
    if auth_user.id != user_id {
        return Err(AppError::Forbidden(anyhow!(
            "You do not have permission to update this user"
        )));
    }

    if let Some(username) = &mut payload.username {
        *username = username.trim().to_string();
    }

    let normalized_phone = match &payload.phone {
        Some(phone) => Some(
            normalize_phone(phone)
                .map_err(|e| AppError::BadRequest(anyhow!("Invalid phone number: {}", e)))?,
        ),
        None => None,
    };

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let user = update_user(&mut conn, user_id, &payload, normalized_phone).await?;

    Ok((
        axum::http::StatusCode::OK,
        Json(Dto {
            data: UserPublic::from(user),
        }),
    ))
}
