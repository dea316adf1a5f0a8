pub mod cars;
pub mod friendships;
pub mod invites;
pub mod trips;
pub mod users;

use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::{middleware, Router};

pub fn v1_routes(state: AppState) -> Router<AppState> {
    // Every v1 route sits behind the identity provider check
    Router::new()
        .nest("/users", users::users_routes())
        .nest("/trips", trips::trips_routes())
        .nest("/friendships", friendships::friendships_routes())
        .nest("/invitations", invites::invitations_routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}
