use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::otp::service::{OtpService, otp_expiry_minutes};
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::otp::{generate_otp, hash_otp};
use crate::utils::password::{hash_password, verify_password};

use super::model::{LoginRequest, RegisterRequestDto, RegisteredUser, User};

const SELECT_USER: &str =
    "SELECT id, email, name, password, is_email_verified, avatar_url, role, created_at, updated_at
     FROM users";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

pub struct UserService;

impl UserService {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Creates a pending (unverified) user with a credentials account and
    /// an initial verification code, all in one transaction.
    ///
    /// The code email goes out only after commit; if dispatch fails, the
    /// pending code is revoked so the account isn't stranded with a code
    /// nobody received, and the caller sees the delivery failure.
    #[instrument(skip(db, email_service, dto))]
    pub async fn register(
        db: &PgPool,
        email_service: &EmailService,
        dto: RegisterRequestDto,
    ) -> Result<RegisteredUser, AppError> {
        let email = dto.email.to_lowercase();

        if Self::find_by_email(db, &email).await?.is_some() {
            return Err(AppError::conflict(anyhow::anyhow!("User already exists")));
        }

        let hashed_password = hash_password(&dto.password)?;
        let otp = generate_otp();
        let otp_hash = hash_otp(&otp)?;
        let otp_expires_at = Utc::now() + Duration::minutes(otp_expiry_minutes());

        let mut tx = db.begin().await?;

        #[derive(sqlx::FromRow)]
        struct NewUser {
            id: Uuid,
            email: String,
        }

        let user = sqlx::query_as::<_, NewUser>(
            "INSERT INTO users (name, email, password, is_email_verified)
             VALUES ($1, $2, $3, FALSE)
             RETURNING id, email",
        )
        .bind(&dto.name)
        .bind(&email)
        .bind(&hashed_password)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(anyhow::anyhow!("User already exists"))
            } else {
                e.into()
            }
        })?;

        sqlx::query(
            "INSERT INTO accounts (user_id, provider, provider_account_id) VALUES ($1, $2, $3)",
        )
        .bind(user.id)
        .bind("credentials")
        .bind(&user.email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO email_otps (user_id, email, otp_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&email)
        .bind(&otp_hash)
        .bind(otp_expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Err(e) = email_service.send_otp_email(&email, &otp).await {
            tracing::error!(error = ?e.error, "failed to send OTP email");
            OtpService::revoke_active(db, user.id).await?;
            return Err(AppError::internal(anyhow::anyhow!(
                "Failed to send OTP email"
            )));
        }

        Ok(RegisteredUser {
            id: user.id,
            email: user.email,
        })
    }

    /// Validates credentials and the verification state.
    ///
    /// Unknown email, a passwordless (OAuth-only) account, and a hash
    /// mismatch all answer the same 401 so the response can't be used to
    /// probe which addresses are registered.
    #[instrument(skip(db, dto))]
    pub async fn login(db: &PgPool, dto: LoginRequest) -> Result<User, AppError> {
        let email = dto.email.to_lowercase();

        let user = Self::find_by_email(db, &email)
            .await?
            .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid credentials.")))?;

        let password_hash = user
            .password
            .as_deref()
            .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid credentials.")))?;

        if !verify_password(&dto.password, password_hash)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Invalid credentials."
            )));
        }

        if !user.is_email_verified {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Email not verified. Please verify your email first."
            )));
        }

        Ok(user)
    }
}
