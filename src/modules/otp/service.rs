use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::otp::{generate_otp, hash_otp, verify_otp_hash};

use super::model::EmailOtp;

/// Wrong guesses allowed before a code is locked out.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

/// Code lifetime; overridable for tests and slow mail setups.
pub fn otp_expiry_minutes() -> i64 {
    std::env::var("OTP_EXPIRY_MINUTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(15)
}

pub struct OtpService;

impl OtpService {
    /// Creates one code for `(user_id, email)` and emails it.
    ///
    /// If dispatch fails the fresh code is revoked before the error
    /// surfaces: an unverified account must never be stuck holding a code
    /// that was never delivered.
    #[instrument(skip(db, email_service))]
    pub async fn issue(
        db: &PgPool,
        email_service: &EmailService,
        user_id: Uuid,
        email: &str,
    ) -> Result<(), AppError> {
        let email = email.to_lowercase();
        let otp = generate_otp();
        let otp_hash = hash_otp(&otp)?;
        let expires_at = Utc::now() + Duration::minutes(otp_expiry_minutes());

        sqlx::query(
            "INSERT INTO email_otps (user_id, email, otp_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(&email)
        .bind(&otp_hash)
        .bind(expires_at)
        .execute(db)
        .await?;

        if let Err(e) = email_service.send_otp_email(&email, &otp).await {
            Self::revoke_active(db, user_id).await?;
            tracing::error!(error = ?e.error, "failed to send OTP email");
            return Err(AppError::internal(anyhow::anyhow!(
                "Failed to send OTP email"
            )));
        }

        Ok(())
    }

    /// Checks a submitted code against the most recently issued active
    /// record and, on a match, marks the user's email verified.
    ///
    /// Code consumption and the verified flag flip in one transaction;
    /// partial application would leave the account in a state neither side
    /// recognizes.
    #[instrument(skip(db, email_service, otp))]
    pub async fn verify(
        db: &PgPool,
        email_service: &EmailService,
        user_id: Uuid,
        email: &str,
        otp: &str,
    ) -> Result<(), AppError> {
        let email = email.to_lowercase();

        let record = sqlx::query_as::<_, EmailOtp>(
            "SELECT id, user_id, email, otp_hash, expires_at, used, revoked, attempts, created_at
             FROM email_otps
             WHERE email = $1 AND user_id = $2 AND used = FALSE AND revoked = FALSE
               AND expires_at > NOW()
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(&email)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Invalid or expired OTP!")))?;

        if record.attempts >= MAX_OTP_ATTEMPTS {
            return Err(AppError::too_many_requests(anyhow::anyhow!(
                "Too many failed attempts. Request a new OTP."
            )));
        }

        if !verify_otp_hash(otp, &record.otp_hash)? {
            sqlx::query("UPDATE email_otps SET attempts = attempts + 1 WHERE id = $1")
                .bind(record.id)
                .execute(db)
                .await?;
            return Err(AppError::bad_request(anyhow::anyhow!("Invalid OTP!")));
        }

        let mut tx = db.begin().await?;

        // Conditional so a replayed code loses the race even if two
        // verifications matched the same record.
        let consumed = sqlx::query(
            "UPDATE email_otps SET used = TRUE, attempts = 0 WHERE id = $1 AND used = FALSE",
        )
        .bind(record.id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Invalid or expired OTP!"
            )));
        }

        sqlx::query("UPDATE users SET is_email_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Err(e) = email_service.send_verification_success_email(&email).await {
            tracing::error!(error = ?e.error, "failed to send verification success email");
        }

        Ok(())
    }

    /// Revokes all outstanding codes for the user and issues a fresh one.
    /// Without the revocation an old emailed code would still verify after
    /// a resend.
    #[instrument(skip(db, email_service))]
    pub async fn resend(
        db: &PgPool,
        email_service: &EmailService,
        user_id: Uuid,
        email: &str,
    ) -> Result<(), AppError> {
        let email = email.to_lowercase();

        #[derive(sqlx::FromRow)]
        struct Verified {
            is_email_verified: bool,
        }

        let user =
            sqlx::query_as::<_, Verified>("SELECT is_email_verified FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found!")))?;

        if user.is_email_verified {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Email already verified!"
            )));
        }

        sqlx::query(
            "UPDATE email_otps SET revoked = TRUE
             WHERE email = $1 AND user_id = $2 AND used = FALSE AND revoked = FALSE",
        )
        .bind(&email)
        .bind(user_id)
        .execute(db)
        .await?;

        Self::issue(db, email_service, user_id, &email).await
    }

    /// Revokes every unused, unrevoked code the user holds.
    pub async fn revoke_active(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE email_otps SET revoked = TRUE
             WHERE user_id = $1 AND used = FALSE AND revoked = FALSE",
        )
        .bind(user_id)
        .execute(db)
        .await?;

        Ok(())
    }
}
