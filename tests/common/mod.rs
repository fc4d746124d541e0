use authgate::config::cors::CorsConfig;
use authgate::config::email::EmailConfig;
use authgate::config::jwt::JwtConfig;
use authgate::config::session::{SessionConfig, SessionMode};
use authgate::router::init_router;
use authgate::state::AppState;
use authgate::utils::password::hash_password;
use authgate::utils::tokens::hash_token;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use uuid::Uuid;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

pub fn test_session_config(mode: SessionMode) -> SessionConfig {
    SessionConfig {
        mode,
        secret: "test_secret_key_for_testing_purposes".to_string(),
        max_age: 604800,
        production: false,
    }
}

pub fn setup_test_app(pool: PgPool, mode: SessionMode) -> Router {
    let state = AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        session_config: test_session_config(mode),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        http: reqwest::Client::new(),
    };
    init_router(state)
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

/// Create a user with a bcrypt-hashed password and a credentials account.
pub async fn create_test_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    verified: bool,
) -> TestUser {
    let hashed = hash_password(password).unwrap();

    #[derive(sqlx::FromRow)]
    struct Row {
        id: Uuid,
    }

    let row = sqlx::query_as::<_, Row>(
        "INSERT INTO users (name, email, password, is_email_verified)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind("Test User")
    .bind(email)
    .bind(&hashed)
    .bind(verified)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO accounts (user_id, provider, provider_account_id) VALUES ($1, $2, $3)")
        .bind(row.id)
        .bind("credentials")
        .bind(email)
        .execute(pool)
        .await
        .unwrap();

    TestUser {
        id: row.id,
        email: email.to_string(),
        password: password.to_string(),
    }
}

/// Insert an OTP record with a known raw code.
#[allow(dead_code)]
pub async fn seed_otp(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
    code: &str,
    expires_in_minutes: i64,
    attempts: i32,
) {
    let otp_hash = hash_password(code).unwrap();
    let expires_at = Utc::now() + Duration::minutes(expires_in_minutes);

    sqlx::query(
        "INSERT INTO email_otps (user_id, email, otp_hash, expires_at, attempts)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(email)
    .bind(&otp_hash)
    .bind(expires_at)
    .bind(attempts)
    .execute(pool)
    .await
    .unwrap();
}

/// Insert a password reset token with a known raw value.
#[allow(dead_code)]
pub async fn seed_reset_token(pool: &PgPool, user_id: Uuid, raw: &str, expires_in_minutes: i64) {
    let expires_at = Utc::now() + Duration::minutes(expires_in_minutes);

    sqlx::query(
        "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(hash_token(raw))
    .bind(expires_at)
    .execute(pool)
    .await
    .unwrap();
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Pull `name=value` out of a response's Set-Cookie headers.
pub fn extract_cookie<B>(response: &Response<B>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .and_then(|v| v.split(';').next())
        .map(|v| v[prefix.len()..].to_string())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
