use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    middlewares::auth::AuthUser,
    models::{
        dto::Dto,
        trips::{TripCreate, TripPublic, TripUpdate},
        users::UserPublic,
    },
    queries::{
        trips::{
            delete_trip as delete_trip_row, find_trip, get_trip_with_owner, get_trips_for_user,
            insert_trip, update_trip as update_trip_row,
        },
        users::find_user_by_id,
    },
};

fn check_date_range(start_date: NaiveDate, end_date: NaiveDate) -> AppResult<()> {
    if start_date > end_date {
        return Err(AppError::BadRequest(anyhow!(
            "Trip start date must not be after its end date"
        )));
    }
    Ok(())
}

fn check_start_time(start_time: &str) -> AppResult<()> {
    NaiveTime::parse_from_str(start_time, "%H:%M").map_err(|_| {
        AppError::BadRequest(anyhow!("Start time must use 24 hour HH:MM format"))
    })?;
    Ok(())
}

pub async fn get_trips(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let trips = get_trips_for_user(&mut conn, auth_user.id).await?;
    let trips: Vec<TripPublic> = trips.into_iter().map(TripPublic::from).collect();

    Ok((axum::http::StatusCode::OK, Json(Dto { data: trips })))
}

pub async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let trip = get_trip_with_owner(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    Ok((
        axum::http::StatusCode::OK,
        Json(Dto {
            data: TripPublic::from(trip),
        }),
    ))
}

pub async fn create_trip(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(mut payload): Json<TripCreate>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid trip data: {}", e)))?;

    payload.title = payload.title.trim().to_string();
    payload.mountain = payload.mountain.trim().to_string();

    check_date_range(payload.start_date, payload.end_date)?;
    if let Some(start_time) = &payload.start_time {
        check_start_time(start_time)?;
    }

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let owner = find_user_by_id(&mut conn, auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("User not found with ID: {}", auth_user.id)))?;

    let trip = insert_trip(&mut conn, auth_user.id, &payload).await?;

    let trip_public = TripPublic {
        id: trip.id,
        title: trip.title,
        start_date: trip.start_date,
        end_date: trip.end_date,
        start_time: trip.start_time,
        mountain: trip.mountain,
        desc: trip.desc,
        created_at: trip.created_at,
        owner: UserPublic::from(owner),
    };

    Ok((
        axum::http::StatusCode::CREATED,
        Json(Dto { data: trip_public }),
    ))
}

pub async fn update_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<TripUpdate>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid trip data: {}", e)))?;

    if let Some(start_time) = &payload.start_time {
        check_start_time(start_time)?;
    }

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let existing = find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    // The date range invariant has to hold after the patch is applied,
    // whichever of the two dates the payload supplies.
    let start_date = payload.start_date.unwrap_or(existing.start_date);
    let end_date = payload.end_date.unwrap_or(existing.end_date);
    check_date_range(start_date, end_date)?;

    update_trip_row(&mut conn, trip_id, &payload).await?;

    // Re-fetch with the owner joined in for the response shape
    let updated = get_trip_with_owner(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    Ok((
        axum::http::StatusCode::OK,
        Json(Dto {
            data: TripPublic::from(updated),
        }),
    ))
}

pub async fn delete_trip(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let trip = find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    if trip.owner != auth_user.id {
        return Err(AppError::Forbidden(anyhow!(
            "Only the trip owner can delete a trip"
        )));
    }

    delete_trip_row(&mut conn, trip_id).await?;

    Ok((axum::http::StatusCode::OK, Json(Dto { data: true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn date_range_accepts_single_day_trips() {
        assert!(check_date_range(date(2026, 1, 10), date(2026, 1, 10)).is_ok());
    }

    #[test]
    fn date_range_rejects_inverted_dates() {
        let err = check_date_range(date(2026, 1, 11), date(2026, 1, 10)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn start_time_accepts_24_hour_format() {
        assert!(check_start_time("07:30").is_ok());
        assert!(check_start_time("23:59").is_ok());
    }

    #[test]
    fn start_time_rejects_malformed_values() {
        assert!(check_start_time("7:30am").is_err());
        assert!(check_start_time("25:00").is_err());
        assert!(check_start_time("first thing").is_err());
    }
}
