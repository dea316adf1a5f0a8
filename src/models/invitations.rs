use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::users::UserPublic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitationenum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Rsvp {
    Accepted,
    Pending,
    Uncertain,
    Declined,
}

/// An invite target: either a registered user or a raw phone number.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Invitee {
    #[serde(rename_all = "camelCase")]
    Registered { user_id: Uuid },
    #[serde(rename_all = "camelCase")]
    External { phone_number: String },
}

#[derive(Debug, Deserialize)]
pub struct InvitationCreate {
    pub invitees: Vec<Invitee>,
}

/*
id UUID PRIMARY KEY,
trip_id UUID NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
user_id UUID REFERENCES users(id) ON DELETE SET NULL,
claim_user_id UUID REFERENCES users(id),
registered_phone VARCHAR(16),
rsvp invitationenum DEFAULT 'pending',
paid INT,
created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
updated_at TIMESTAMPTZ NOT NULL DEFAULT now()

-- at most one invitation per (trip, user) and per (trip, phone):
CREATE UNIQUE INDEX unique_invitation_registered_user
ON invitations (trip_id, user_id) WHERE user_id IS NOT NULL;
CREATE UNIQUE INDEX unique_invitation_external_user
ON invitations (trip_id, registered_phone) WHERE registered_phone IS NOT NULL;
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Option<Uuid>,
    pub claim_user_id: Option<Uuid>,
    pub registered_phone: Option<String>,
    pub rsvp: Option<Rsvp>,
    pub paid: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct InvitationUpdate {
    pub invite_token: Uuid,
    pub rsvp: Rsvp,
}

#[derive(Debug, Default, Serialize)]
pub struct AttendanceList {
    pub accepted: Vec<UserPublic>,
    pub pending: Vec<UserPublic>,
    pub uncertain: Vec<UserPublic>,
    pub declined: Vec<UserPublic>,
}

#[derive(Debug, Serialize)]
pub struct InvitationBatchResponse {
    pub all_invites_processed_successfully: bool,
    pub sms_failures_count: usize,
    pub sms_phone_number_failures: Vec<String>,
}

/// A pending invitation as shown in the caller's inbox.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InvitationPublic {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub trip_owner: String,
    pub trip_title: String,
    pub rsvp: Option<Rsvp>,
    pub recipient_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invitee_deserializes_registered_variant() {
        let json = r#"{"type": "registered", "userId": "2d6cb813-51a1-4f78-8c9c-297c0b5a5b4f"}"#;
        let invitee: Invitee = serde_json::from_str(json).unwrap();
        match invitee {
            Invitee::Registered { user_id } => {
                assert_eq!(
                    user_id,
                    "2d6cb813-51a1-4f78-8c9c-297c0b5a5b4f".parse::<Uuid>().unwrap()
                );
            }
            Invitee::External { .. } => panic!("expected registered invitee"),
        }
    }

    #[test]
    fn invitee_deserializes_external_variant() {
        let json = r#"{"type": "external", "phoneNumber": "(555) 123-4567"}"#;
        let invitee: Invitee = serde_json::from_str(json).unwrap();
        match invitee {
            Invitee::External { phone_number } => assert_eq!(phone_number, "(555) 123-4567"),
            Invitee::Registered { .. } => panic!("expected external invitee"),
        }
    }

    #[test]
    fn invitee_rejects_unknown_tag() {
        let json = r#"{"type": "carrier_pigeon", "phoneNumber": "5551234567"}"#;
        assert!(serde_json::from_str::<Invitee>(json).is_err());
    }

    #[test]
    fn rsvp_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Rsvp::Uncertain).unwrap(), r#""uncertain""#);
        assert_eq!(serde_json::to_string(&Rsvp::Accepted).unwrap(), r#""accepted""#);
    }
}
