//! User entity and the DTOs of the registration/login flow.
//!
//! Wire DTOs are camelCase to match the cookie names (`refreshToken`,
//! `auth-session`) and the JSON shapes the web client consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A user row.
///
/// `password` is `None` for OAuth-only accounts. This struct never leaves
/// the server; responses use [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_email_verified: bool,
    pub avatar_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user shape exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub is_email_verified: bool,
    pub avatar_url: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_email_verified: user.is_email_verified,
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Minimal identity echoed back after registration; the client needs the
/// id to drive OTP verification.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredUser,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(length(equal = 6))]
    pub otp: String,
    #[validate(email)]
    pub email: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    #[validate(email)]
    pub email: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Returned by login, OAuth sync, and refresh: the access token travels in
/// the body, the refresh credential only ever in its httpOnly cookie.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_user_wire_shape_is_camel_case() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            name: Some("Ada".to_string()),
            password: Some("hash".to_string()),
            is_email_verified: true,
            avatar_url: None,
            role: "user".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let serialized = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(serialized.contains("isEmailVerified"));
        assert!(serialized.contains("avatarUrl"));
        // The password hash must never appear in the public shape.
        assert!(!serialized.contains("hash"));
    }

    #[test]
    fn test_verify_otp_request_deserialize() {
        let user_id = Uuid::new_v4();
        let json = format!(
            r#"{{"otp":"123456","email":"a@x.com","userId":"{}"}}"#,
            user_id
        );
        let dto: VerifyOtpRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(dto.otp, "123456");
        assert_eq!(dto.user_id, user_id);
    }

    #[test]
    fn test_register_dto_validation() {
        let dto = RegisterRequestDto {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = RegisterRequestDto {
            name: "Ada".to_string(),
            email: "a@x.com".to_string(),
            password: "short".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = RegisterRequestDto {
            name: "Ada".to_string(),
            email: "a@x.com".to_string(),
            password: "Passw0rd1".to_string(),
        };
        assert!(dto.validate().is_ok());
    }
}
