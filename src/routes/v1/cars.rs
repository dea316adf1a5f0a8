use crate::app_state::AppState;
use crate::handlers::v1::cars;
use axum::{routing::get, Router};

pub fn cars_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cars::get_cars).post(cars::create_car))
        .route(
            "/{car_id}",
            get(cars::get_car_by_id).delete(cars::delete_car),
        )
        .route(
            "/{car_id}/passengers",
            get(cars::get_car_passengers).post(cars::add_passenger),
        )
}
