use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::service::AuthService;
use crate::modules::otp::service::OtpService;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::tokens::TokenMeta;
use crate::validator::ValidatedJson;

use super::model::{
    LoginRequest, LoginResponse, MessageResponse, PublicUser, RegisterRequestDto, RegisterResponse,
    ResendOtpRequest, VerifyOtpRequest,
};
use super::service::UserService;

/// Register a new user and send the verification code
#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered, verification code sent", body = RegisterResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    let user = UserService::register(&state.db, &email_service, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully! Please check your email for the OTP."
                .to_string(),
            user,
        }),
    ))
}

/// Verify the emailed code and mark the account verified
#[utoipa::path(
    post,
    path = "/api/user/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn verify_email_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    OtpService::verify(&state.db, &email_service, dto.user_id, &dto.email, &dto.otp).await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully!".to_string(),
    }))
}

/// Revoke outstanding codes and send a fresh one
#[utoipa::path(
    post,
    path = "/api/user/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "New code sent", body = MessageResponse),
        (status = 400, description = "Email already verified", body = ErrorResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn resend_email_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResendOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    OtpService::resend(&state.db, &email_service, dto.user_id, &dto.email).await?;

    Ok(Json(MessageResponse {
        message: "New OTP sent successfully!".to_string(),
    }))
}

/// Credential login: refresh cookie plus access token on success
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Email not verified", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, jar, headers, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let user = UserService::login(&state.db, dto).await?;

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

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = UserService::find_by_id(&state.db, auth_user.id)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

    Ok(Json(PublicUser::from(&user)))
}
