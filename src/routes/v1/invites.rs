use crate::app_state::AppState;
use crate::handlers::v1::invites;
use axum::{routing::get, Router};

pub fn invitations_routes() -> Router<AppState> {
    Router::new().route("/me", get(invites::my_invitations))
}
