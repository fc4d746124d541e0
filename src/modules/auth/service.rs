use axum_extra::extract::cookie::CookieJar;
use reqwest::header;
use sqlx::PgPool;
use tracing::instrument;

use crate::config::jwt::JwtConfig;
use crate::config::session::{SessionConfig, SessionMode};
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::session::{clear_session, create_session, verify_session};
use crate::utils::tokens::{
    REFRESH_COOKIE, TokenMeta, generate_refresh_token, refresh_removal_cookie,
    refresh_token_cookie, revoke_refresh_token, rotate_refresh_token, verify_refresh_token,
};

use super::model::GithubEmail;

pub struct AuthService;

impl AuthService {
    /// Finds the user owning `email` or creates one vouched for by the
    /// provider (email pre-verified), then makes sure an account link for
    /// `(user, provider)` exists. Linking is idempotent.
    #[instrument(skip(db, avatar_url))]
    pub async fn link_or_create(
        db: &PgPool,
        provider: &str,
        provider_account_id: &str,
        email: &str,
        name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<User, AppError> {
        let email = email.to_lowercase();

        if let Some(user) = UserService::find_by_email(db, &email).await? {
            sqlx::query(
                "INSERT INTO accounts (user_id, provider, provider_account_id)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, provider) DO NOTHING",
            )
            .bind(user.id)
            .bind(provider)
            .bind(provider_account_id)
            .execute(db)
            .await?;

            return Ok(user);
        }

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, name, avatar_url, is_email_verified)
             VALUES ($1, $2, $3, TRUE)
             RETURNING id, email, name, password, is_email_verified, avatar_url, role, created_at, updated_at",
        )
        .bind(&email)
        .bind(name)
        .bind(avatar_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO accounts (user_id, provider, provider_account_id) VALUES ($1, $2, $3)",
        )
        .bind(user.id)
        .bind(provider)
        .bind(provider_account_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Resolves the email for a GitHub sign-in when the sync payload
    /// doesn't carry one, by asking GitHub's `/user/emails` endpoint with
    /// the user's provider token. Prefers the verified primary address,
    /// falls back to any verified one.
    #[instrument(skip(http, access_token))]
    pub async fn resolve_github_email(
        http: &reqwest::Client,
        access_token: &str,
    ) -> Result<String, AppError> {
        let response = http
            .get("https://api.github.com/user/emails")
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .header(header::USER_AGENT, "authgate")
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("GitHub email lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::internal(anyhow::anyhow!(
                "GitHub email lookup failed with status {}",
                response.status()
            )));
        }

        let emails: Vec<GithubEmail> = response
            .json()
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("GitHub email lookup failed: {}", e)))?;

        emails
            .iter()
            .find(|e| e.primary && e.verified)
            .or_else(|| emails.iter().find(|e| e.verified))
            .map(|e| e.email.to_lowercase())
            .ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!(
                    "A verified email address is required for GitHub sign-in"
                ))
            })
    }

    /// Issues session credentials for a signed-in user: an access token in
    /// the return value plus, depending on the configured scheme, either a
    /// rotating refresh cookie or a stateless session cookie.
    #[instrument(skip(db, jwt_config, session_config, user, meta, jar))]
    pub async fn issue_credentials(
        db: &PgPool,
        jwt_config: &JwtConfig,
        session_config: &SessionConfig,
        user: &User,
        meta: &TokenMeta,
        jar: CookieJar,
    ) -> Result<(CookieJar, String), AppError> {
        let access_token = create_access_token(user.id, &user.email, jwt_config)?;

        let jar = match session_config.mode {
            SessionMode::Rotating => {
                let raw = generate_refresh_token(db, user.id, jwt_config, meta).await?;
                jar.add(refresh_token_cookie(
                    &raw,
                    jwt_config,
                    session_config.production,
                ))
            }
            SessionMode::Stateless => create_session(user, session_config, jar)?,
        };

        Ok((jar, access_token))
    }

    /// Exchanges the session credential for a fresh access token.
    ///
    /// Rotating mode also rotates the refresh token; a stale cookie that
    /// lost a rotation race is rejected, never granted a second rotation.
    #[instrument(skip(db, jwt_config, session_config, meta, jar))]
    pub async fn refresh(
        db: &PgPool,
        jwt_config: &JwtConfig,
        session_config: &SessionConfig,
        meta: &TokenMeta,
        jar: CookieJar,
    ) -> Result<(CookieJar, String, User), AppError> {
        match session_config.mode {
            SessionMode::Rotating => {
                let raw = jar
                    .get(REFRESH_COOKIE)
                    .map(|c| c.value().to_string())
                    .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("No refresh token")))?;

                let (user, _record) =
                    verify_refresh_token(db, &raw).await?.ok_or_else(|| {
                        AppError::unauthorized(anyhow::anyhow!("Invalid or expired refresh token"))
                    })?;

                let new_raw = rotate_refresh_token(db, &raw, jwt_config, meta)
                    .await?
                    .ok_or_else(|| {
                        AppError::unauthorized(anyhow::anyhow!("Invalid or expired refresh token"))
                    })?;

                let access_token = create_access_token(user.id, &user.email, jwt_config)?;
                let jar = jar.add(refresh_token_cookie(
                    &new_raw,
                    jwt_config,
                    session_config.production,
                ));

                Ok((jar, access_token, user))
            }
            SessionMode::Stateless => {
                let session_user = verify_session(&jar, session_config)
                    .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("No active session")))?;

                let user = UserService::find_by_id(db, session_user.id)
                    .await?
                    .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("No active session")))?;

                let access_token = create_access_token(user.id, &user.email, jwt_config)?;

                Ok((jar, access_token, user))
            }
        }
    }

    /// Revokes the presented refresh token (if any) and clears both cookie
    /// names, regardless of the configured scheme, so switching modes never
    /// strands a stale cookie on the client.
    #[instrument(skip(db, jar))]
    pub async fn logout(db: &PgPool, jar: CookieJar) -> Result<CookieJar, AppError> {
        if let Some(raw) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()) {
            revoke_refresh_token(db, &raw).await?;
        }

        let jar = clear_session(jar);
        Ok(jar.remove(refresh_removal_cookie()))
    }
}
