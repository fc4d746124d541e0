use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_access_token;
use crate::utils::session::verify_session;

/// Extractor identifying the authenticated caller.
///
/// Accepts either credential the server issues: the signed session cookie
/// is checked first, then a `Bearer` access token. Handlers that need
/// profile data resolve the user by id; the claims deliberately carry only
/// identity.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(session_user) = verify_session(&jar, &state.session_config) {
            return Ok(AuthUser {
                id: session_user.id,
                email: session_user.email,
            });
        }

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if let Some(token) = bearer {
            let claims = verify_access_token(token, &state.jwt_config)?;
            let id = Uuid::parse_str(&claims.sub)
                .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid token subject")))?;

            return Ok(AuthUser {
                id,
                email: claims.email,
            });
        }

        Err(AppError::unauthorized(anyhow::anyhow!("Unauthorized")))
    }
}
