use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        trips::{Trip, TripCreate, TripPublic, TripUpdate},
        users::UserPublic,
    },
};

/// A trip joined with its owner's user row, flattened for `query_as`.
#[derive(Debug, sqlx::FromRow)]
pub struct TripWithOwnerRow {
    pub id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<String>,
    pub mountain: String,
    pub desc: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub owner: OwnerColumns,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OwnerColumns {
    pub o_id: Uuid,
    pub o_phone: Option<String>,
    pub o_firstname: Option<String>,
    pub o_lastname: Option<String>,
    pub o_username: Option<String>,
    pub o_is_onboarded: bool,
    pub o_avatar_public_url: Option<String>,
}

impl From<OwnerColumns> for UserPublic {
    fn from(row: OwnerColumns) -> Self {
        UserPublic {
            id: row.o_id,
            phone: row.o_phone,
            firstname: row.o_firstname,
            lastname: row.o_lastname,
            username: row.o_username,
            is_onboarded: row.o_is_onboarded,
            avatar_public_url: row.o_avatar_public_url,
        }
    }
}

impl From<TripWithOwnerRow> for TripPublic {
    fn from(row: TripWithOwnerRow) -> Self {
        TripPublic {
            id: row.id,
            title: row.title,
            start_date: row.start_date,
            end_date: row.end_date,
            start_time: row.start_time,
            mountain: row.mountain,
            desc: row.desc,
            created_at: row.created_at,
            owner: row.owner.into(),
        }
    }
}

const TRIP_WITH_OWNER_COLUMNS: &str =
    "t.id, t.title, t.start_date, t.end_date, t.start_time, t.mountain, t.\"desc\", t.created_at,
     o.id AS o_id, o.phone AS o_phone, o.firstname AS o_firstname, o.lastname AS o_lastname,
     o.username AS o_username, o.is_onboarded AS o_is_onboarded,
     o.avatar_public_url AS o_avatar_public_url";

/// Trips the user owns plus trips they hold an invitation to.
pub async fn get_trips_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> AppResult<Vec<TripWithOwnerRow>> {
    let query = format!(
        "SELECT {TRIP_WITH_OWNER_COLUMNS}
         FROM trips t
         JOIN users o ON o.id = t.owner
         WHERE t.owner = $1
            OR EXISTS (
                SELECT 1 FROM invitations i
                WHERE i.trip_id = t.id AND i.user_id = $1
            )
         ORDER BY t.start_date"
    );
    let trips = sqlx::query_as::<_, TripWithOwnerRow>(&query)
        .bind(user_id)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (get_trips_for_user): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching trips"))
        })?;

    Ok(trips)
}

pub async fn get_trip_with_owner(
    conn: &mut PgConnection,
    trip_id: Uuid,
) -> AppResult<Option<TripWithOwnerRow>> {
    let query = format!(
        "SELECT {TRIP_WITH_OWNER_COLUMNS}
         FROM trips t
         JOIN users o ON o.id = t.owner
         WHERE t.id = $1"
    );
    let trip = sqlx::query_as::<_, TripWithOwnerRow>(&query)
        .bind(trip_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (get_trip_with_owner): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching trip"))
        })?;

    Ok(trip)
}

pub async fn find_trip(conn: &mut PgConnection, trip_id: Uuid) -> AppResult<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
        .bind(trip_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database query error (find_trip): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error fetching trip"))
        })?;

    Ok(trip)
}

pub async fn insert_trip(
    conn: &mut PgConnection,
    owner: Uuid,
    trip: &TripCreate,
) -> AppResult<Trip> {
    let new_trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (id, owner, title, start_date, end_date, start_time, mountain, \"desc\")
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(owner)
    .bind(&trip.title)
    .bind(trip.start_date)
    .bind(trip.end_date)
    .bind(trip.start_time.as_deref())
    .bind(&trip.mountain)
    .bind(trip.desc.as_deref())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database insert error (insert_trip): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error creating trip"))
    })?;

    Ok(new_trip)
}

/// Partial update: only supplied fields overwrite existing ones.
pub async fn update_trip(
    conn: &mut PgConnection,
    trip_id: Uuid,
    update: &TripUpdate,
) -> AppResult<Trip> {
    let trip = sqlx::query_as::<_, Trip>(
        "UPDATE trips
         SET title = COALESCE($2, title),
             start_date = COALESCE($3, start_date),
             end_date = COALESCE($4, end_date),
             start_time = COALESCE($5, start_time),
             mountain = COALESCE($6, mountain),
             \"desc\" = COALESCE($7, \"desc\"),
             updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(trip_id)
    .bind(update.title.as_deref())
    .bind(update.start_date)
    .bind(update.end_date)
    .bind(update.start_time.as_deref())
    .bind(update.mountain.as_deref())
    .bind(update.desc.as_deref())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound(anyhow::anyhow!("Trip not found")),
        _ => {
            tracing::error!("Database update error (update_trip): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error updating trip"))
        }
    })?;

    Ok(trip)
}

/// Cars and invitations cascade at the database level.
pub async fn delete_trip(conn: &mut PgConnection, trip_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM trips WHERE id = $1")
        .bind(trip_id)
        .execute(conn)
        .await
        .map_err(|e| {
            tracing::error!("Database delete error (delete_trip): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error deleting trip"))
        })?;

    Ok(())
}
