use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    middlewares::auth::AuthUser,
    models::{
        dto::Dto,
        friendships::{
            FriendRequestType, FriendshipCreate, FriendshipPublic, FriendshipStatus,
            FriendshipUpdate,
        },
        users::{UserPublic, UserWithFriendshipInfo},
    },
    queries::{
        friendships::{
            delete_friendship, find_friendship, find_friendship_for_pair, get_accepted_friends,
            get_pending_requests, insert_friendship, update_friendship_status,
        },
        users::find_user_by_id,
    },
};

fn conflict_message(status: FriendshipStatus) -> &'static str {
    match status {
        FriendshipStatus::Pending => "A friend request is already pending between these users.",
        FriendshipStatus::Accepted => "These users are already friends.",
        FriendshipStatus::Blocked => "A friendship interaction is blocked between these users.",
        FriendshipStatus::Rejected => {
            "A previous friendship interaction exists between these users."
        }
    }
}

pub async fn create_friend_request(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<FriendshipCreate>,
) -> AppResult<impl IntoResponse> {
    if payload.addressee_id == auth_user.id {
        return Err(AppError::BadRequest(anyhow!(
            "You cannot send a friend request to yourself"
        )));
    }

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    find_user_by_id(&mut conn, payload.addressee_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow!("User not found with ID: {}", payload.addressee_id))
        })?;

    // One row per unordered pair, whichever side asked first
    if let Some(existing) =
        find_friendship_for_pair(&mut conn, auth_user.id, payload.addressee_id).await?
    {
        return Err(AppError::Conflict(anyhow!(
            "{}",
            conflict_message(existing.status)
        )));
    }

    insert_friendship(&mut conn, auth_user.id, payload.addressee_id).await?;

    Ok((axum::http::StatusCode::CREATED, Json(Dto { data: true })))
}

pub async fn respond_to_friend_request(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(friendship_id): Path<Uuid>,
    Json(payload): Json<FriendshipUpdate>,
) -> AppResult<impl IntoResponse> {
    if !matches!(
        payload.status,
        FriendshipStatus::Accepted | FriendshipStatus::Rejected
    ) {
        return Err(AppError::BadRequest(anyhow!(
            "A friend request can only be accepted or rejected"
        )));
    }

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let friendship = find_friendship(&mut conn, friendship_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow!("Friend request not found with ID: {}", friendship_id))
        })?;

    if friendship.addressee_id != auth_user.id {
        return Err(AppError::Forbidden(anyhow!(
            "Only the addressee can respond to a friend request"
        )));
    }

    if friendship.status != FriendshipStatus::Pending {
        return Err(AppError::Conflict(anyhow!(
            "This friend request has already been responded to"
        )));
    }

    let updated = update_friendship_status(&mut conn, friendship_id, payload.status).await?;

    let requester = find_user_by_id(&mut conn, updated.requester_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError(anyhow!("Requester row missing")))?;
    let addressee = find_user_by_id(&mut conn, updated.addressee_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError(anyhow!("Addressee row missing")))?;

    let friendship_public = FriendshipPublic {
        id: updated.id,
        requester: UserPublic::from(requester),
        addressee: UserPublic::from(addressee),
        status: updated.status,
        created_at: updated.created_at,
    };

    Ok((
        axum::http::StatusCode::OK,
        Json(Dto {
            data: friendship_public,
        }),
    ))
}

pub async fn remove_friendship(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let friendship = find_friendship(&mut conn, friendship_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow!("Friendship not found with ID: {}", friendship_id))
        })?;

    if friendship.requester_id != auth_user.id && friendship.addressee_id != auth_user.id {
        return Err(AppError::Forbidden(anyhow!(
            "Only a participant can remove a friendship"
        )));
    }

    if friendship.status == FriendshipStatus::Pending {
        tracing::warn!(
            "Deleting a still pending friend request {} at the request of {}",
            friendship_id,
            auth_user.id
        );
    }

    delete_friendship(&mut conn, friendship_id).await?;

    Ok((axum::http::StatusCode::OK, Json(Dto { data: true })))
}

pub async fn get_friends(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let friends = get_accepted_friends(&mut conn, auth_user.id).await?;
    let friends: Vec<UserWithFriendshipInfo> = friends
        .into_iter()
        .map(|row| UserWithFriendshipInfo {
            user: row.user,
            friendship_id: row.friendship_id,
        })
        .collect();

    Ok((axum::http::StatusCode::OK, Json(Dto { data: friends })))
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestQuery {
    pub request_type: Option<FriendRequestType>,
}

pub async fn check_friend_requests(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<FriendRequestQuery>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    find_user_by_id(&mut conn, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("User not found with ID: {}", user_id)))?;

    let requests = get_pending_requests(&mut conn, user_id, query.request_type).await?;
    let requests: Vec<FriendshipPublic> =
        requests.into_iter().map(FriendshipPublic::from).collect();

    Ok((axum::http::StatusCode::OK, Json(Dto { data: requests })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_the_existing_state() {
        assert!(conflict_message(FriendshipStatus::Pending).contains("pending"));
        assert!(conflict_message(FriendshipStatus::Accepted).contains("already friends"));
        assert!(conflict_message(FriendshipStatus::Blocked).contains("blocked"));
    }

    #[test]
    fn request_type_parses_lowercase_values() {
        let incoming: FriendRequestType = serde_json::from_str("\"incoming\"").unwrap();
        assert_eq!(incoming, FriendRequestType::Incoming);
        let outgoing: FriendRequestType = serde_json::from_str("\"outgoing\"").unwrap();
        assert_eq!(outgoing, FriendRequestType::Outgoing);
        assert!(serde_json::from_str::<FriendRequestType>("\"sideways\"").is_err());
    }
}
