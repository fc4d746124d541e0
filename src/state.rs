use sqlx::PgPool;

use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::email::EmailConfig;
use crate::config::jwt::JwtConfig;
use crate::config::session::SessionConfig;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub session_config: SessionConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    /// Outbound client for provider API calls (GitHub email lookup).
    pub http: reqwest::Client,
}

pub async fn init_app_state() -> AppState {
    AppState {
        db: init_db_pool().await,
        jwt_config: JwtConfig::from_env(),
        session_config: SessionConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        http: reqwest::Client::new(),
    }
}
