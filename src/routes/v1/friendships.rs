use crate::app_state::AppState;
use crate::handlers::v1::friendships;
use axum::{
    routing::{get, post},
    Router,
};

pub fn friendships_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(friendships::create_friend_request))
        .route("/me", get(friendships::get_friends))
        .route(
            "/{id}",
            get(friendships::check_friend_requests)
                .patch(friendships::respond_to_friend_request)
                .delete(friendships::remove_friendship),
        )
}
