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
        cars::{Car, CarCreate, CarPublic, Passenger, PassengerCreate},
        dto::Dto,
        users::UserPublic,
    },
    queries::{
        cars::{
            delete_car as delete_car_row, find_car, get_cars_for_trip, get_passenger_users,
            get_passengers, insert_car, insert_passenger,
        },
        trips::find_trip,
        users::find_user_by_id,
    },
};

/// Seat bookkeeping for adding a passenger: reject a full car, a taken
/// seat, and a rider who is already aboard.
fn check_seat_assignment(
    car: &Car,
    existing: &[Passenger],
    user_id: Uuid,
    seat_position: i32,
) -> AppResult<()> {
    if existing.iter().any(|p| p.user_id == user_id) {
        return Err(AppError::Conflict(anyhow!(
            "User is already a passenger in this car"
        )));
    }
    if existing.len() as i32 >= car.seat_count {
        return Err(AppError::Conflict(anyhow!("Car is already full")));
    }
    if seat_position > car.seat_count {
        return Err(AppError::BadRequest(anyhow!(
            "Seat position {} exceeds the car's {} seats",
            seat_position,
            car.seat_count
        )));
    }
    if existing
        .iter()
        .any(|p| p.seat_position == Some(seat_position))
    {
        return Err(AppError::Conflict(anyhow!(
            "Seat {} is already taken",
            seat_position
        )));
    }
    Ok(())
}

pub async fn get_cars(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    let cars = get_cars_for_trip(&mut conn, trip_id).await?;

    let mut cars_public = Vec::with_capacity(cars.len());
    for car in cars {
        let owner = find_user_by_id(&mut conn, car.owner)
            .await?
            .ok_or_else(|| AppError::InternalServerError(anyhow!("Car owner row missing")))?;
        let passengers = get_passenger_users(&mut conn, car.id).await?;
        cars_public.push(CarPublic {
            id: car.id,
            trip_id: car.trip_id,
            seat_count: car.seat_count,
            owner: UserPublic::from(owner),
            passengers,
        });
    }

    Ok((axum::http::StatusCode::OK, Json(Dto { data: cars_public })))
}

pub async fn get_car_by_id(
    State(state): State<AppState>,
    Path((trip_id, car_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let car = find_car(&mut conn, trip_id, car_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Car not found with ID: {}", car_id)))?;

    Ok((axum::http::StatusCode::OK, Json(Dto { data: car })))
}

pub async fn create_car(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<CarCreate>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid car data: {}", e)))?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    let owner = find_user_by_id(&mut conn, auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("User not found with ID: {}", auth_user.id)))?;

    let car = insert_car(&mut conn, trip_id, auth_user.id, payload.seat_count).await?;

    let car_public = CarPublic {
        id: car.id,
        trip_id: car.trip_id,
        seat_count: car.seat_count,
        owner: UserPublic::from(owner),
        passengers: Vec::new(),
    };

    Ok((
        axum::http::StatusCode::CREATED,
        Json(Dto { data: car_public }),
    ))
}

pub async fn delete_car(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((trip_id, car_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let trip = find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    let car = find_car(&mut conn, trip_id, car_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Car not found with ID: {}", car_id)))?;

    if car.owner != auth_user.id && trip.owner != auth_user.id {
        return Err(AppError::Forbidden(anyhow!(
            "Only the car owner or the trip owner can delete a car"
        )));
    }

    delete_car_row(&mut conn, car_id).await?;

    Ok((axum::http::StatusCode::OK, Json(Dto { data: true })))
}

pub async fn add_passenger(
    State(state): State<AppState>,
    Path((trip_id, car_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PassengerCreate>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid passenger data: {}", e)))?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let car = find_car(&mut conn, trip_id, car_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Car not found with ID: {}", car_id)))?;

    find_user_by_id(&mut conn, payload.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow!("User not found with ID: {}", payload.user_id))
        })?;

    let existing = get_passengers(&mut conn, car_id).await?;
    check_seat_assignment(&car, &existing, payload.user_id, payload.seat_position)?;

    let passenger =
        insert_passenger(&mut conn, car_id, payload.user_id, payload.seat_position).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(Dto { data: passenger }),
    ))
}

pub async fn get_car_passengers(
    State(state): State<AppState>,
    Path((trip_id, car_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    find_car(&mut conn, trip_id, car_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Car not found with ID: {}", car_id)))?;

    let passengers = get_passengers(&mut conn, car_id).await?;

    Ok((axum::http::StatusCode::OK, Json(Dto { data: passengers })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn car(seat_count: i32) -> Car {
        Car {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            seat_count,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn passenger(car_id: Uuid, seat_position: i32) -> Passenger {
        Passenger {
            user_id: Uuid::new_v4(),
            car_id,
            seat_position: Some(seat_position),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_free_seat_in_open_car() {
        let car = car(4);
        let existing = vec![passenger(car.id, 1)];
        assert!(check_seat_assignment(&car, &existing, Uuid::new_v4(), 2).is_ok());
    }

    #[test]
    fn rejects_duplicate_rider() {
        let car = car(4);
        let aboard = passenger(car.id, 1);
        let user_id = aboard.user_id;
        let err = check_seat_assignment(&car, &[aboard], user_id, 2).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn rejects_taken_seat() {
        let car = car(4);
        let existing = vec![passenger(car.id, 2)];
        let err = check_seat_assignment(&car, &existing, Uuid::new_v4(), 2).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn rejects_full_car() {
        let car = car(2);
        let existing = vec![passenger(car.id, 1), passenger(car.id, 2)];
        let err = check_seat_assignment(&car, &existing, Uuid::new_v4(), 2).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn rejects_seat_beyond_capacity() {
        let car = car(4);
        let err = check_seat_assignment(&car, &[], Uuid::new_v4(), 5).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
