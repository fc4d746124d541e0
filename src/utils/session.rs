//! Stateless signed session cookie.
//!
//! The `auth-session` cookie carries a signed claim identifying the user;
//! validity is purely cryptographic plus expiry, nothing is stored server
//! side. Cookie operations go through the request's [`CookieJar`] so any
//! previously queued `Set-Cookie` headers are appended to, never replaced.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::session::SessionConfig;
use crate::modules::users::model::User;
use crate::utils::errors::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "auth-session";

/// The user identity carried inside a session claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    user: SessionUser,
    exp: usize,
    iat: usize,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
        }
    }
}

/// Signs a session claim for `user` and adds the cookie to `jar`.
pub fn create_session(
    user: &User,
    config: &SessionConfig,
    jar: CookieJar,
) -> Result<CookieJar, AppError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        user: SessionUser::from(user),
        exp: (now + config.max_age) as usize,
        iat: now as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to sign session: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.production)
        .max_age(time::Duration::seconds(config.max_age))
        .build();

    Ok(jar.add(cookie))
}

/// Extracts and verifies the session cookie.
///
/// Returns `None` on a missing cookie, bad signature, or expiry; never an
/// error, so callers can treat any failure as "not logged in".
pub fn verify_session(jar: &CookieJar, config: &SessionConfig) -> Option<SessionUser> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();

    decode::<SessionClaims>(
        &token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.user)
    .ok()
}

/// Queues removal of the session cookie, leaving other cookies intact.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}
