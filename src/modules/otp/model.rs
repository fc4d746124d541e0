use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored one-time code. `otp_hash` is a bcrypt digest; the raw code
/// only exists in the verification email.
#[derive(Debug, Clone, FromRow)]
pub struct EmailOtp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub revoked: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}
