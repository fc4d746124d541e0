use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::tokens::TokenMeta;
use crate::validator::ValidatedJson;

use super::model::{GithubSyncRequest, GoogleSyncRequest};
use super::service::AuthService;
use crate::modules::users::model::{LoginResponse, MessageResponse, PublicUser};

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Sync a Google sign-in: link or create the account, issue credentials
#[utoipa::path(
    post,
    path = "/api/auth/google",
    request_body = GoogleSyncRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "OAuth"
)]
#[instrument(skip(state, jar, headers, dto))]
pub async fn google_oauth(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<GoogleSyncRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let user = AuthService::link_or_create(
        &state.db,
        "google",
        &dto.google_id,
        &dto.email,
        dto.name.as_deref(),
        dto.image.as_deref(),
    )
    .await?;

    let meta = TokenMeta::from_headers(&headers);
    let (jar, access_token) = AuthService::issue_credentials(
        &state.db,
        &state.jwt_config,
        &state.session_config,
        &user,
        &meta,
        jar,
    )
    .await?;

    Ok((
        jar,
        Json(LoginResponse {
            access_token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Sync a GitHub sign-in, resolving the email via GitHub when absent
#[utoipa::path(
    post,
    path = "/api/auth/github",
    request_body = GithubSyncRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Bad request - no verified email available", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "OAuth"
)]
#[instrument(skip(state, jar, headers, dto))]
pub async fn github_oauth(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<GithubSyncRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let email = match dto.email.as_deref() {
        Some(email) => email.to_lowercase(),
        None => {
            let token = dto.access_token.as_deref().ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!(
                    "Email or GitHub access token is required"
                ))
            })?;
            AuthService::resolve_github_email(&state.http, token).await?
        }
    };

    let user = AuthService::link_or_create(
        &state.db,
        "github",
        &dto.github_id,
        &email,
        dto.name.as_deref(),
        dto.avatar_url.as_deref(),
    )
    .await?;

    let meta = TokenMeta::from_headers(&headers);
    let (jar, access_token) = AuthService::issue_credentials(
        &state.db,
        &state.jwt_config,
        &state.session_config,
        &user,
        &meta,
        jar,
    )
    .await?;

    Ok((
        jar,
        Json(LoginResponse {
            access_token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Exchange the session credential for a fresh access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New access token issued", body = LoginResponse),
        (status = 401, description = "Missing, invalid, or expired credential", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "OAuth"
)]
#[instrument(skip(state, jar, headers))]
pub async fn refresh_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let meta = TokenMeta::from_headers(&headers);
    let (jar, access_token, user) = AuthService::refresh(
        &state.db,
        &state.jwt_config,
        &state.session_config,
        &meta,
        jar,
    )
    .await?;

    Ok((
        jar,
        Json(LoginResponse {
            access_token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Revoke the refresh token and clear session cookies
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "OAuth"
)]
#[instrument(skip(state, jar))]
pub async fn logout_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    let jar = AuthService::logout(&state.db, jar).await?;

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}
