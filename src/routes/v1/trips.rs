use crate::app_state::AppState;
use crate::handlers::v1::{invites, trips};

use super::cars;
use axum::{
    routing::{get, patch},
    Router,
};

pub fn trips_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(trips::get_trips).post(trips::create_trip))
        .route(
            "/{trip_id}",
            get(trips::get_trip)
                .patch(trips::update_trip)
                .delete(trips::delete_trip),
        )
        .route(
            "/{trip_id}/invites",
            get(invites::get_invited_users).post(invites::create_invitations),
        )
        .route("/{trip_id}/rsvp", patch(invites::rsvp))
        .nest("/{trip_id}/cars", cars::cars_routes())
}
