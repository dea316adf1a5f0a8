use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::users::UserPublic;

/*
id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
trip_id UUID NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
owner UUID NOT NULL REFERENCES users(id),
seat_count INT NOT NULL DEFAULT 4,
created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Car {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub owner: Uuid,
    pub seat_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CarCreate {
    #[validate(range(min = 1, message = "A car needs at least one seat"))]
    pub seat_count: i32,
}

#[derive(Debug, Serialize)]
pub struct CarPublic {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_count: i32,
    pub owner: UserPublic,
    pub passengers: Vec<UserPublic>,
}

/*
user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
car_id UUID NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
seat_position INT,
created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
PRIMARY KEY (user_id, car_id)
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Passenger {
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub seat_position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PassengerCreate {
    pub user_id: Uuid,
    #[validate(range(min = 1, message = "Seat position must be at least 1"))]
    pub seat_position: i32,
}
