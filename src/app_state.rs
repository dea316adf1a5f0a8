use std::sync::Arc;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub http_client: reqwest::Client,
    pub config: Arc<Config>,
}
