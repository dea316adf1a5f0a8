use std::collections::HashSet;

use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::Connection;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    middlewares::auth::AuthUser,
    models::{
        dto::Dto,
        invitations::{
            AttendanceList, Invitation, InvitationBatchResponse, InvitationCreate,
            InvitationUpdate, Invitee, Rsvp,
        },
        trips::Trip,
        users::User,
    },
    queries::{
        invitations::{
            attendance_rows, claim_invitation, find_invitation, insert_invitations,
            invitations_for_trip, pending_invitations_for_user, AttendeeRow, NewInvitation,
        },
        trips::find_trip,
        users::{find_user_by_id, find_user_by_phone},
    },
    utils::{
        phone::normalize_phone,
        sms::{build_deep_link, send_sms_invite},
    },
};

/// Everything already known about the trip's invitations, consulted when
/// deciding what to do with each invitee. The sets grow as rows are staged
/// so duplicates inside one batch are caught too.
struct InviteLookup {
    trip_owner: Uuid,
    invited_user_ids: HashSet<Uuid>,
    invited_phones: HashSet<String>,
}

impl InviteLookup {
    fn new(trip_owner: Uuid, existing: &[Invitation]) -> Self {
        InviteLookup {
            trip_owner,
            invited_user_ids: existing.iter().filter_map(|i| i.user_id).collect(),
            invited_phones: existing
                .iter()
                .filter_map(|i| i.registered_phone.clone())
                .collect(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum InviteDecision {
    Skip(&'static str),
    /// Send an SMS and, on success, stage a row. `user_id` is None for a
    /// phone number no registered user owns.
    Deliver {
        user_id: Option<Uuid>,
        phone: String,
    },
}

fn plan_registered(user: Option<&User>, lookup: &InviteLookup) -> InviteDecision {
    let Some(user) = user else {
        return InviteDecision::Skip("user does not exist");
    };
    if user.id == lookup.trip_owner {
        return InviteDecision::Skip("invitee is the trip owner");
    }
    if lookup.invited_user_ids.contains(&user.id) {
        return InviteDecision::Skip("user is already invited");
    }
    let Some(phone) = &user.phone else {
        return InviteDecision::Skip("user has no phone number on file");
    };
    InviteDecision::Deliver {
        user_id: Some(user.id),
        phone: phone.clone(),
    }
}

/// A phone number owned by a registered user is folded into the registered
/// path so the same person never ends up with both kinds of invitation.
fn plan_external(phone_owner: Option<&User>, phone: &str, lookup: &InviteLookup) -> InviteDecision {
    match phone_owner {
        Some(user) => plan_registered(Some(user), lookup),
        None => {
            if lookup.invited_phones.contains(phone) {
                return InviteDecision::Skip("phone number is already invited");
            }
            InviteDecision::Deliver {
                user_id: None,
                phone: phone.to_string(),
            }
        }
    }
}

pub async fn create_invitations(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<InvitationCreate>,
) -> AppResult<impl IntoResponse> {
    if payload.invitees.is_empty() {
        return Err(AppError::BadRequest(anyhow!("Invitee list cannot be empty")));
    }

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let trip = find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    let existing = invitations_for_trip(&mut conn, trip_id).await?;
    let mut lookup = InviteLookup::new(trip.owner, &existing);

    let mut staged: Vec<NewInvitation> = Vec::new();
    let mut sms_failures: Vec<String> = Vec::new();

    for invitee in &payload.invitees {
        let decision = match invitee {
            Invitee::Registered { user_id } => {
                let user = find_user_by_id(&mut conn, *user_id).await?;
                plan_registered(user.as_ref(), &lookup)
            }
            Invitee::External { phone_number } => {
                let phone = normalize_phone(phone_number).map_err(|e| {
                    AppError::BadRequest(anyhow!("Invalid phone number: {}", e))
                })?;
                let phone_owner = find_user_by_phone(&mut conn, &phone).await?;
                plan_external(phone_owner.as_ref(), &phone, &lookup)
            }
        };

        match decision {
            InviteDecision::Skip(reason) => {
                tracing::info!("Skipping invitee for trip {}: {}", trip_id, reason);
            }
            InviteDecision::Deliver { user_id, phone } => {
                let invitation_id = Uuid::new_v4();
                let deep_link =
                    build_deep_link(&state.config.frontend_scheme, trip_id, invitation_id);

                match send_sms_invite(&state.http_client, &state.config, &phone, &deep_link).await
                {
                    Ok(()) => {
                        if let Some(user_id) = user_id {
                            lookup.invited_user_ids.insert(user_id);
                        } else {
                            lookup.invited_phones.insert(phone.clone());
                        }
                        staged.push(NewInvitation {
                            id: invitation_id,
                            trip_id,
                            user_id,
                            registered_phone: user_id.is_none().then_some(phone),
                        });
                    }
                    Err(e) => {
                        tracing::warn!("SMS send failed for {}: {}", phone, e);
                        sms_failures.push(phone);
                    }
                }
            }
        }
    }

    // One commit for everything that survived; SMS failures were dropped
    // above and never roll back the successes.
    if !staged.is_empty() {
        let mut tx = conn.begin().await.map_err(|e| {
            AppError::InternalServerError(anyhow!("Database transaction failed: {}", e))
        })?;
        insert_invitations(&mut tx, &staged).await?;
        tx.commit().await.map_err(|e| {
            AppError::InternalServerError(anyhow!("Failed to commit transaction: {}", e))
        })?;
    }

    let response = InvitationBatchResponse {
        all_invites_processed_successfully: sms_failures.is_empty(),
        sms_failures_count: sms_failures.len(),
        sms_phone_number_failures: sms_failures,
    };

    Ok((
        axum::http::StatusCode::CREATED,
        Json(Dto { data: response }),
    ))
}

/// An invitation can be claimed exactly once, only by the person it was
/// addressed to, and never by the trip owner.
fn check_rsvp_claim(invitation: &Invitation, trip: &Trip, responder: &User) -> AppResult<()> {
    if invitation.rsvp != Some(Rsvp::Pending) || invitation.claim_user_id.is_some() {
        return Err(AppError::Conflict(anyhow!(
            "This invitation has already been responded to"
        )));
    }
    if responder.id == trip.owner {
        return Err(AppError::Forbidden(anyhow!(
            "The trip owner cannot RSVP to their own trip"
        )));
    }
    let addressed_to_responder = match invitation.user_id {
        Some(target) => target == responder.id,
        None => matches!(
            (&invitation.registered_phone, &responder.phone),
            (Some(invited), Some(own)) if invited == own
        ),
    };
    if !addressed_to_responder {
        return Err(AppError::Forbidden(anyhow!(
            "This invitation is addressed to someone else"
        )));
    }
    Ok(())
}

pub async fn rsvp(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<InvitationUpdate>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let trip = find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    let invitation = find_invitation(&mut conn, trip_id, payload.invite_token)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow!(
                "Invitation not found with token: {}",
                payload.invite_token
            ))
        })?;

    let responder = find_user_by_id(&mut conn, auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("User not found with ID: {}", auth_user.id)))?;

    check_rsvp_claim(&invitation, &trip, &responder)?;

    let updated = claim_invitation(&mut conn, invitation.id, responder.id, payload.rsvp).await?;

    Ok((axum::http::StatusCode::OK, Json(Dto { data: updated })))
}

fn bucket_by_rsvp(rows: Vec<AttendeeRow>) -> AttendanceList {
    let mut list = AttendanceList::default();
    for row in rows {
        match row.rsvp {
            Some(Rsvp::Accepted) => list.accepted.push(row.user),
            Some(Rsvp::Pending) => list.pending.push(row.user),
            Some(Rsvp::Uncertain) => list.uncertain.push(row.user),
            Some(Rsvp::Declined) => list.declined.push(row.user),
            None => continue,
        }
    }
    list
}

pub async fn get_invited_users(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    find_trip(&mut conn, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Trip not found with ID: {}", trip_id)))?;

    let rows = attendance_rows(&mut conn, trip_id).await?;

    Ok((
        axum::http::StatusCode::OK,
        Json(Dto {
            data: bucket_by_rsvp(rows),
        }),
    ))
}

pub async fn my_invitations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!("Failed to acquire database connection: {}", e))
    })?;

    let invitations = pending_invitations_for_user(&mut conn, auth_user.id).await?;

    Ok((axum::http::StatusCode::OK, Json(Dto { data: invitations })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::UserPublic;
    use chrono::Utc;

    fn user(phone: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            phone: phone.map(str::to_string),
            firstname: None,
            lastname: None,
            username: Some("powderhound".to_string()),
            is_onboarded: true,
            avatar_public_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn trip(owner: Uuid) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            owner,
            title: "Opening weekend".to_string(),
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 12, 5).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2026, 12, 7).unwrap(),
            start_time: None,
            mountain: "Alta".to_string(),
            desc: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn invitation(trip_id: Uuid, user_id: Option<Uuid>, phone: Option<&str>) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            trip_id,
            user_id,
            claim_user_id: None,
            registered_phone: phone.map(str::to_string),
            rsvp: Some(Rsvp::Pending),
            paid: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lookup(trip_owner: Uuid) -> InviteLookup {
        InviteLookup {
            trip_owner,
            invited_user_ids: HashSet::new(),
            invited_phones: HashSet::new(),
        }
    }

    #[test]
    fn registered_invitee_with_phone_is_delivered() {
        let invitee = user(Some("5551234567"));
        let decision = plan_registered(Some(&invitee), &lookup(Uuid::new_v4()));
        assert_eq!(
            decision,
            InviteDecision::Deliver {
                user_id: Some(invitee.id),
                phone: "5551234567".to_string(),
            }
        );
    }

    #[test]
    fn missing_user_is_skipped() {
        assert!(matches!(
            plan_registered(None, &lookup(Uuid::new_v4())),
            InviteDecision::Skip(_)
        ));
    }

    #[test]
    fn trip_owner_is_never_invited() {
        let owner = user(Some("5551234567"));
        let decision = plan_registered(Some(&owner), &lookup(owner.id));
        assert!(matches!(decision, InviteDecision::Skip(_)));
    }

    #[test]
    fn already_invited_user_is_skipped() {
        let invitee = user(Some("5551234567"));
        let mut lookup = lookup(Uuid::new_v4());
        lookup.invited_user_ids.insert(invitee.id);
        assert!(matches!(
            plan_registered(Some(&invitee), &lookup),
            InviteDecision::Skip(_)
        ));
    }

    #[test]
    fn registered_user_without_phone_is_skipped() {
        let invitee = user(None);
        assert!(matches!(
            plan_registered(Some(&invitee), &lookup(Uuid::new_v4())),
            InviteDecision::Skip(_)
        ));
    }

    #[test]
    fn external_phone_owned_by_registered_user_reconciles_to_registered() {
        let owner_of_phone = user(Some("5551234567"));
        let decision = plan_external(
            Some(&owner_of_phone),
            "5551234567",
            &lookup(Uuid::new_v4()),
        );
        assert_eq!(
            decision,
            InviteDecision::Deliver {
                user_id: Some(owner_of_phone.id),
                phone: "5551234567".to_string(),
            }
        );
    }

    #[test]
    fn unknown_external_phone_is_delivered_without_user() {
        let decision = plan_external(None, "5559876543", &lookup(Uuid::new_v4()));
        assert_eq!(
            decision,
            InviteDecision::Deliver {
                user_id: None,
                phone: "5559876543".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_external_phone_is_skipped() {
        let mut lookup = lookup(Uuid::new_v4());
        lookup.invited_phones.insert("5559876543".to_string());
        assert!(matches!(
            plan_external(None, "5559876543", &lookup),
            InviteDecision::Skip(_)
        ));
    }

    #[test]
    fn rsvp_rejects_second_response_with_conflict() {
        let responder = user(Some("5551234567"));
        let trip = trip(Uuid::new_v4());
        let mut invitation = invitation(trip.id, Some(responder.id), None);
        invitation.rsvp = Some(Rsvp::Accepted);
        invitation.claim_user_id = Some(responder.id);
        let err = check_rsvp_claim(&invitation, &trip, &responder).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn rsvp_rejects_trip_owner() {
        let owner = user(Some("5551234567"));
        let trip = trip(owner.id);
        let invitation = invitation(trip.id, Some(owner.id), None);
        let err = check_rsvp_claim(&invitation, &trip, &owner).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn rsvp_matches_external_invitation_by_phone() {
        let responder = user(Some("5551234567"));
        let trip = trip(Uuid::new_v4());
        let invitation = invitation(trip.id, None, Some("5551234567"));
        assert!(check_rsvp_claim(&invitation, &trip, &responder).is_ok());
    }

    #[test]
    fn rsvp_rejects_unrelated_responder() {
        let responder = user(Some("5550000000"));
        let trip = trip(Uuid::new_v4());
        let invitation = invitation(trip.id, None, Some("5551234567"));
        let err = check_rsvp_claim(&invitation, &trip, &responder).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn attendance_rows_bucket_by_rsvp() {
        let attendee = |rsvp| AttendeeRow {
            user: UserPublic::from(user(Some("5551234567"))),
            rsvp,
        };
        let list = bucket_by_rsvp(vec![
            attendee(Some(Rsvp::Accepted)),
            attendee(Some(Rsvp::Accepted)),
            attendee(Some(Rsvp::Declined)),
            attendee(Some(Rsvp::Uncertain)),
            attendee(Some(Rsvp::Pending)),
            attendee(None),
        ]);
        assert_eq!(list.accepted.len(), 2);
        assert_eq!(list.pending.len(), 1);
        assert_eq!(list.uncertain.len(), 1);
        assert_eq!(list.declined.len(), 1);
    }
}
