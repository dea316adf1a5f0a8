use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        invitations::{Invitation, InvitationPublic, Rsvp},
        users::UserPublic,
    },
};

/// An invitation row staged by the batch loop, not yet committed.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Option<Uuid>,
    pub registered_phone: Option<String>,
}

pub async fn invitations_for_trip(
    conn: &mut PgConnection,
    trip_id: Uuid,
) -> AppResult<Vec<Invitation>> {
    let invitations =
        sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE trip_id = $1")
            .bind(trip_id)
            .fetch_all(conn)
            .await
            .map_err(|e| {
                tracing::error!("Database query error (invitations_for_trip): {:?}", e);
                AppError::InternalServerError(anyhow::anyhow!(
                    "Database error fetching invitations"
                ))
            })?;

    Ok(invitations)
}

pub async fn find_invitation(
    conn: &mut PgConnection,
    trip_id: Uuid,
    invitation_id: Uuid,
) -> AppResult<Option<Invitation>> {
    let invitation = sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations WHERE trip_id = $1 AND id = $2",
    )
    .bind(trip_id)
    .bind(invitation_id)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database query error (find_invitation): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error fetching invitation"))
    })?;

    Ok(invitation)
}

/// Insert every staged row in one transaction. Per-invitee SMS failures were
/// already filtered out by the caller; this commit covers the survivors.
pub async fn insert_invitations(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    staged: &[NewInvitation],
) -> AppResult<()> {
    for invitation in staged {
        sqlx::query(
            "INSERT INTO invitations (id, trip_id, user_id, registered_phone, rsvp)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(invitation.id)
        .bind(invitation.trip_id)
        .bind(invitation.user_id)
        .bind(invitation.registered_phone.as_deref())
        .bind(Rsvp::Pending)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            // Concurrent duplicate invites land here via the partial
            // unique indexes; surfaced as a conflict, not a 500.
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(anyhow::anyhow!(
                        "An invitation already exists for this trip and invitee"
                    ));
                }
            }
            tracing::error!("Database insert error (insert_invitations): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error creating invitations"))
        })?;
    }

    Ok(())
}

/// Record the RSVP and rebind the row to the responding user. For external
/// invitations created against a bare phone number this is the moment
/// user_id is first populated.
pub async fn claim_invitation(
    conn: &mut PgConnection,
    invitation_id: Uuid,
    responder_id: Uuid,
    rsvp: Rsvp,
) -> AppResult<Invitation> {
    let invitation = sqlx::query_as::<_, Invitation>(
        "UPDATE invitations
         SET rsvp = $2, user_id = $3, claim_user_id = $3, updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(invitation_id)
    .bind(rsvp)
    .bind(responder_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound(anyhow::anyhow!("Invitation not found")),
        _ => {
            tracing::error!("Database update error (claim_invitation): {:?}", e);
            AppError::InternalServerError(anyhow::anyhow!("Database error updating invitation"))
        }
    })?;

    Ok(invitation)
}

/// One attendee for the attendance listing: user columns plus their rsvp.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendeeRow {
    #[sqlx(flatten)]
    pub user: UserPublic,
    pub rsvp: Option<Rsvp>,
}

pub async fn attendance_rows(
    conn: &mut PgConnection,
    trip_id: Uuid,
) -> AppResult<Vec<AttendeeRow>> {
    let rows = sqlx::query_as::<_, AttendeeRow>(
        "SELECT u.id, u.phone, u.firstname, u.lastname, u.username,
                u.is_onboarded, u.avatar_public_url, i.rsvp
         FROM invitations i
         JOIN users u ON u.id = i.user_id
         WHERE i.trip_id = $1",
    )
    .bind(trip_id)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database query error (attendance_rows): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error fetching attendance"))
    })?;

    Ok(rows)
}

/// Pending invitations addressed to the user, with enough trip context for
/// an inbox listing.
pub async fn pending_invitations_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> AppResult<Vec<InvitationPublic>> {
    let invitations = sqlx::query_as::<_, InvitationPublic>(
        "SELECT i.id, i.trip_id,
                COALESCE(o.username, o.firstname, '') AS trip_owner,
                t.title AS trip_title,
                i.rsvp, i.user_id AS recipient_id, i.created_at
         FROM invitations i
         JOIN trips t ON t.id = i.trip_id
         JOIN users o ON o.id = t.owner
         WHERE i.user_id = $1 AND i.rsvp = $2
         ORDER BY i.created_at DESC",
    )
    .bind(user_id)
    .bind(Rsvp::Pending)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!("Database query error (pending_invitations_for_user): {:?}", e);
        AppError::InternalServerError(anyhow::anyhow!("Database error fetching invitations"))
    })?;

    Ok(invitations)
}
