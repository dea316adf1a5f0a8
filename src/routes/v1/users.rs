use crate::app_state::AppState;
use crate::handlers::v1::users;
use axum::{routing::get, Router};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::get_users))
        .route(
            "/{user_id}",
            get(users::get_user_by_id).patch(users::patch_user),
        )
}
