use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        cars::{Car, Passenger},
        users::UserPublic,
    },
};

pub async fn get_cars_for_trip(conn: &mut PgConnection, trip_id: Uuid) -> AppResult<Vec<Car>> {
    let cars = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE trip_id = $1 ORDER BY created_at")
        .bind(trip_id)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (get_cars_for_trip): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching cars"))
        })?;

    Ok(cars)
}

/// Cars are always addressed through their trip, so a car id from another
/// trip comes back as None rather than leaking across trips.
pub async fn find_car(
    conn: &mut PgConnection,
    trip_id: Uuid,
    car_id: Uuid,
) -> AppResult<Option<Car>> {
    let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE trip_id = $1 AND id = $2")
        .bind(trip_id)
        .bind(car_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (find_car): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching car"))
        })?;

    Ok(car)
}

pub async fn insert_car(
    conn: &mut PgConnection,
    trip_id: Uuid,
    owner: Uuid,
    seat_count: i32,
) -> AppResult<Car> {
    let car = sqlx::query_as::<_, Car>(
        "INSERT INTO cars (id, trip_id, owner, seat_count) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(trip_id)
    .bind(owner)
    .bind(seat_count)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database insert error (insert_car): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error creating car"))
    })?;

    Ok(car)
}

pub async fn delete_car(conn: &mut PgConnection, car_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM cars WHERE id = $1")
        .bind(car_id)
        .execute(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database delete error (delete_car): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error deleting car"))
        })?;

    Ok(())
}

pub async fn get_passengers(conn: &mut PgConnection, car_id: Uuid) -> AppResult<Vec<Passenger>> {
    let passengers = sqlx::query_as::<_, Passenger>(
        "SELECT * FROM passengers WHERE car_id = $1 ORDER BY seat_position",
    )
    .bind(car_id)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database query error (get_passengers): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error fetching passengers"))
    })?;

    Ok(passengers)
}

pub async fn get_passenger_users(
    conn: &mut PgConnection,
    car_id: Uuid,
) -> AppResult<Vec<UserPublic>> {
    let users = sqlx::query_as::<_, UserPublic>(
        "SELECT u.id, u.phone, u.firstname, u.lastname, u.username,
                u.is_onboarded, u.avatar_public_url
         FROM passengers p
         JOIN users u ON u.id = p.user_id
         WHERE p.car_id = $1
         ORDER BY p.seat_position",
    )
    .bind(car_id)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database query error (get_passenger_users): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error fetching passengers"))
    })?;

    Ok(users)
}

pub async fn insert_passenger(
    conn: &mut PgConnection,
    car_id: Uuid,
    user_id: Uuid,
    seat_position: i32,
) -> AppResult<Passenger> {
    let passenger = sqlx::query_as::<_, Passenger>(
        "INSERT INTO passengers (user_id, car_id, seat_position)
         VALUES ($1, $2, $3)
         RETURNING *",
    )
    .bind(user_id)
    .bind(car_id)
    .bind(seat_position)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict(anyhow::anyhow!(
                    "User is already a passenger in this car"
                ));
            }
        }
        tracing::error!("Database insert error (insert_passenger): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error adding passenger"))
    })?;

    Ok(passenger)
}
