use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::users::UserPublic;

/*
id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
owner UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
title TEXT NOT NULL CHECK (title != ''),
start_date DATE NOT NULL,
end_date DATE NOT NULL,
start_time TEXT DEFAULT '00:00',
mountain TEXT NOT NULL,
"desc" TEXT,
created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
CHECK (start_date <= end_date)
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<String>,
    pub mountain: String,
    pub desc: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TripCreate {
    #[validate(length(min = 1, message = "Trip title cannot be empty"))]
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<String>,
    #[validate(length(min = 1, message = "Mountain cannot be empty"))]
    pub mountain: String,
    pub desc: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TripUpdate {
    #[validate(length(min = 1, message = "Trip title cannot be empty"))]
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    #[validate(length(min = 1, message = "Mountain cannot be empty"))]
    pub mountain: Option<String>,
    pub desc: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TripPublic {
    pub id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<String>,
    pub mountain: String,
    pub desc: Option<String>,
    pub owner: UserPublic,
    pub created_at: DateTime<Utc>,
}
