use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::config::email::EmailConfig;
use crate::modules::users::service::UserService;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::password::hash_password;
use crate::utils::tokens::{TokenMeta, generate_raw_token, hash_token};

use super::model::{ForgotPasswordRequest, ResetPasswordRequest};

/// Reset link lifetime.
pub fn reset_token_expiry_minutes() -> i64 {
    std::env::var("RESET_TOKEN_EXPIRY_MINUTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60)
}

pub struct PasswordService;

impl PasswordService {
    /// Issues a reset link for the address, if it is registered.
    ///
    /// Always completes without telling the caller whether the user exists;
    /// the uniform response upstream is the enumeration defense. A mail
    /// delivery failure is logged but deliberately not surfaced for the
    /// same reason.
    #[instrument(skip(db, email_config, dto, meta))]
    pub async fn request_reset(
        db: &PgPool,
        email_config: &EmailConfig,
        dto: ForgotPasswordRequest,
        meta: &TokenMeta,
    ) -> Result<(), AppError> {
        let email = dto.email.trim().to_lowercase();

        let Some(user) = UserService::find_by_email(db, &email).await? else {
            return Ok(());
        };

        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE user_id = $1 AND used = FALSE")
            .bind(user.id)
            .execute(db)
            .await?;

        let raw_token = generate_raw_token();
        let expires_at = Utc::now() + Duration::minutes(reset_token_expiry_minutes());

        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(hash_token(&raw_token))
        .bind(expires_at)
        .bind(&meta.user_agent)
        .bind(&meta.ip)
        .execute(db)
        .await?;

        let reset_url = Self::reset_url(&email_config.frontend_url, &raw_token, &email)?;

        let email_service = EmailService::new(email_config.clone());
        if let Err(e) = email_service
            .send_password_reset_email(&email, reset_url.as_str())
            .await
        {
            tracing::error!(error = ?e.error, "failed to send password reset email");
        }

        Ok(())
    }

    /// Consumes a reset token and installs the new password hash, both in
    /// one transaction. Any lookup failure answers the same message so the
    /// endpoint reveals nothing about which tokens exist.
    #[instrument(skip(db, dto))]
    pub async fn perform_reset(db: &PgPool, dto: ResetPasswordRequest) -> Result<(), AppError> {
        let email = dto.email.trim().to_lowercase();

        #[derive(sqlx::FromRow)]
        struct ResetRow {
            id: Uuid,
            user_id: Uuid,
            email: String,
        }

        let row = sqlx::query_as::<_, ResetRow>(
            "SELECT prt.id, prt.user_id, u.email
             FROM password_reset_tokens prt
             JOIN users u ON u.id = prt.user_id
             WHERE prt.token_hash = $1 AND prt.used = FALSE AND prt.expires_at > NOW()",
        )
        .bind(hash_token(&dto.token))
        .fetch_optional(db)
        .await?
        .filter(|row| row.email == email)
        .ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("Invalid or expired reset token"))
        })?;

        let hashed_password = hash_password(&dto.new_password)?;

        let mut tx = db.begin().await?;

        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(&hashed_password)
            .bind(row.user_id)
            .execute(&mut *tx)
            .await?;

        let consumed = sqlx::query(
            "UPDATE password_reset_tokens SET used = TRUE WHERE id = $1 AND used = FALSE",
        )
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Invalid or expired reset token"
            )));
        }

        tx.commit().await?;

        Ok(())
    }

    fn reset_url(frontend_url: &str, raw_token: &str, email: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(frontend_url)
            .map_err(|e| AppError::internal(anyhow::anyhow!("Invalid FRONTEND_URL: {}", e)))?;
        url.set_path("/reset-password");
        url.query_pairs_mut()
            .append_pair("token", raw_token)
            .append_pair("email", email);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_url_encodes_query() {
        let url =
            PasswordService::reset_url("http://localhost:3000", "abc123", "a+b@x.com").unwrap();
        assert_eq!(url.path(), "/reset-password");
        let query = url.query().unwrap();
        assert!(query.contains("token=abc123"));
        // '+' in the local part must not survive as a literal plus
        assert!(!query.contains("a+b@x.com"));
    }
}
