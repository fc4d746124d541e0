//! Opaque refresh token lifecycle.
//!
//! Raw tokens are 32 bytes of entropy, handed to the client once in an
//! httpOnly cookie. Only the sha256 digest is persisted; a raw token is
//! valid while its digest matches an unrevoked, unexpired record. Every
//! use rotates the token: the old record is revoked and a new one issued,
//! so a replayed token fails verification.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::users::model::User;
use crate::utils::errors::AppError;

/// Name of the refresh token cookie.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Request metadata stored alongside a refresh token for audit purposes.
#[derive(Debug, Clone, Default)]
pub struct TokenMeta {
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl TokenMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // First hop of X-Forwarded-For is the client when behind a proxy.
        let ip = headers
            .get("x-forwarded-for")
            .or_else(|| headers.get("x-real-ip"))
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self { user_agent, ip }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

/// Generates a raw refresh token: 32 random bytes, hex encoded.
pub fn generate_raw_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The only form of a token that ever touches storage.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Issues a refresh token for `user_id` and returns the raw value for
/// cookie delivery. The raw value is never persisted or logged.
pub async fn generate_refresh_token(
    db: &PgPool,
    user_id: Uuid,
    jwt_config: &JwtConfig,
    meta: &TokenMeta,
) -> Result<String, AppError> {
    let raw = generate_raw_token();
    let expires_at = Utc::now() + Duration::seconds(jwt_config.refresh_token_expiry);

    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at, user_agent, ip_address)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(hash_token(&raw))
    .bind(expires_at)
    .bind(&meta.user_agent)
    .bind(&meta.ip)
    .execute(db)
    .await?;

    Ok(raw)
}

/// Looks up a raw token. `None` means unauthenticated, not an error: the
/// caller decides whether that is a 401 or a silent logged-out state.
pub async fn verify_refresh_token(
    db: &PgPool,
    raw: &str,
) -> Result<Option<(User, RefreshTokenRecord)>, AppError> {
    let record = sqlx::query_as::<_, RefreshTokenRecord>(
        "SELECT id, user_id, token_hash, expires_at, revoked
         FROM refresh_tokens
         WHERE token_hash = $1 AND revoked = FALSE AND expires_at > NOW()",
    )
    .bind(hash_token(raw))
    .fetch_optional(db)
    .await?;

    let Some(record) = record else {
        return Ok(None);
    };

    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, name, password, is_email_verified, avatar_url, role, created_at, updated_at
         FROM users WHERE id = $1",
    )
    .bind(record.user_id)
    .fetch_optional(db)
    .await?;

    Ok(user.map(|user| (user, record)))
}

/// Revokes the record matching `old_raw` and issues a replacement for the
/// same user.
///
/// The conditional UPDATE is the arbiter under concurrency: two requests
/// racing on the same stale token produce exactly one rotation, the loser
/// gets `None` and must be rejected.
pub async fn rotate_refresh_token(
    db: &PgPool,
    old_raw: &str,
    jwt_config: &JwtConfig,
    meta: &TokenMeta,
) -> Result<Option<String>, AppError> {
    let revoked = sqlx::query_as::<_, RefreshTokenRecord>(
        "UPDATE refresh_tokens SET revoked = TRUE
         WHERE token_hash = $1 AND revoked = FALSE AND expires_at > NOW()
         RETURNING id, user_id, token_hash, expires_at, revoked",
    )
    .bind(hash_token(old_raw))
    .fetch_optional(db)
    .await?;

    let Some(revoked) = revoked else {
        return Ok(None);
    };

    let raw = generate_refresh_token(db, revoked.user_id, jwt_config, meta).await?;
    Ok(Some(raw))
}

/// Marks any record matching `raw` as revoked. Used at logout; a token
/// that never existed is not an error.
pub async fn revoke_refresh_token(db: &PgPool, raw: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE token_hash = $1")
        .bind(hash_token(raw))
        .execute(db)
        .await?;

    Ok(())
}

/// Cookie carrying the raw refresh token: httpOnly, path `/`, SameSite=Lax,
/// `Secure` only in production, max-age matching the token lifetime.
pub fn refresh_token_cookie(
    raw: &str,
    jwt_config: &JwtConfig,
    production: bool,
) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, raw.to_string()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(production)
        .max_age(time::Duration::seconds(jwt_config.refresh_token_expiry))
        .build()
}

/// Cookie shape used to remove the refresh cookie; path must match the
/// issued cookie for browsers to drop it.
pub fn refresh_removal_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, "")).path("/").build()
}
