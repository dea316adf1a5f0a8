use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;

const VONAGE_SMS_URL: &str = "https://rest.nexmo.com/sms/json";

#[derive(Debug, Deserialize)]
struct SmsResponse {
    messages: Vec<SmsMessageStatus>,
}

#[derive(Debug, Deserialize)]
struct SmsMessageStatus {
    status: String,
    #[serde(rename = "error-text")]
    error_text: Option<String>,
}

/// RSVP deep link delivered by SMS and resolved client-side.
pub fn build_deep_link(scheme: &str, trip_id: Uuid, invitation_id: Uuid) -> String {
    format!("{scheme}:///trips/{trip_id}/rsvp?invite_token={invitation_id}")
}

/// Text an RSVP link to an invited phone number through the Vonage SMS API.
pub async fn send_sms_invite(
    client: &reqwest::Client,
    config: &Config,
    phone: &str,
    deep_link: &str,
) -> Result<()> {
    let text = format!("You have been invited to a trip, click here to RSVP, {deep_link}");
    let params = [
        ("api_key", config.vonage_api_key.as_str()),
        ("api_secret", config.vonage_api_secret.as_str()),
        ("from", config.vonage_number.as_str()),
        ("to", phone),
        ("text", text.as_str()),
    ];

    let response = client
        .post(VONAGE_SMS_URL)
        .form(&params)
        .send()
        .await
        .context("Failed to reach SMS provider")?;

    let body: SmsResponse = response
        .json()
        .await
        .context("Failed to parse SMS provider response")?;

    // Vonage reports per-message delivery status; "0" means accepted.
    match body.messages.first() {
        Some(message) if message.status == "0" => Ok(()),
        Some(message) => Err(anyhow!(
            "SMS provider rejected message (status {}): {}",
            message.status,
            message.error_text.as_deref().unwrap_or("no detail")
        )),
        None => Err(anyhow!("SMS provider returned no message status")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_link_embeds_trip_and_token() {
        let trip_id: Uuid = "94f5b8a4-7f74-4a74-9f06-20e865f6a3bb".parse().unwrap();
        let invitation_id: Uuid = "4b824c9a-64ae-41b7-b5ad-5e3e3d9c1c43".parse().unwrap();
        assert_eq!(
            build_deep_link("powder", trip_id, invitation_id),
            "powder:///trips/94f5b8a4-7f74-4a74-9f06-20e865f6a3bb/rsvp\
             ?invite_token=4b824c9a-64ae-41b7-b5ad-5e3e3d9c1c43"
        );
    }

    #[test]
    fn provider_response_parses_error_text() {
        let raw = r#"{"messages": [{"status": "2", "error-text": "Missing to param"}]}"#;
        let parsed: SmsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.messages[0].status, "2");
        assert_eq!(parsed.messages[0].error_text.as_deref(), Some("Missing to param"));
    }
}
