use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use tracing::instrument;

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::users::model::MessageResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::tokens::TokenMeta;
use crate::validator::ValidatedJson;

use super::model::{ForgotPasswordRequest, ResetPasswordRequest};
use super::service::PasswordService;

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/user/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageResponse),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Password"
)]
#[instrument(skip(state, headers, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let meta = TokenMeta::from_headers(&headers);
    PasswordService::request_reset(&state.db, &state.email_config, dto, &meta).await?;

    Ok(Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
    }))
}

/// Reset the password using an emailed token
#[utoipa::path(
    post,
    path = "/api/user/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset successful", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Password"
)]
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    PasswordService::perform_reset(&state.db, dto).await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully. You can now log in with your new password."
            .to_string(),
    }))
}
