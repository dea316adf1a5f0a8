use anyhow::{Context, Result};
use std::env;

/// Runtime configuration pulled from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,

    pub vonage_api_key: String,
    pub vonage_api_secret: String,
    pub vonage_number: String,

    // App scheme used to build RSVP deep links, e.g. "powder"
    pub frontend_scheme: String,

    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_key: env::var("SUPABASE_KEY").context("SUPABASE_KEY must be set")?,
            vonage_api_key: env::var("VONAGE_API_KEY").context("VONAGE_API_KEY must be set")?,
            vonage_api_secret: env::var("VONAGE_API_SECRET")
                .context("VONAGE_API_SECRET must be set")?,
            vonage_number: env::var("VONAGE_NUMBER").context("VONAGE_NUMBER must be set")?,
            frontend_scheme: env::var("FRONTEND_SCHEME")
                .unwrap_or_else(|_| "powder".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        })
    }
}
