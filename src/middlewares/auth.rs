use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
};

/// The validated caller, attached as a request extension for handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: Uuid,
}

/// Extract the bearer token and validate it against the identity provider.
/// Token validation itself is fully delegated; this middleware only cares
/// about getting a user id back.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized(anyhow!("Missing bearer token")))?
        .to_string();

    let url = format!("{}/auth/v1/user", state.config.supabase_url);
    let response = state
        .http_client
        .get(&url)
        .header("apikey", &state.config.supabase_key)
        .bearer_auth(&token)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Identity provider unreachable: {:?}", e);
            AppError::ServiceUnavailable(anyhow!("Identity provider unreachable"))
        })?;

    if !response.status().is_success() {
        return Err(AppError::Forbidden(anyhow!(
            "Invalid or expired authentication token"
        )));
    }

    let identity: IdentityUser = response.json().await.map_err(|e| {
        tracing::error!("Unexpected identity provider response: {:?}", e);
        AppError::InternalServerError(anyhow!("Unexpected identity provider response"))
    })?;

    req.extensions_mut().insert(AuthUser { id: identity.id });
    Ok(next.run(req).await)
}
