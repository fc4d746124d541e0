use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{GithubSyncRequest, GoogleSyncRequest};
use crate::modules::password::model::{ForgotPasswordRequest, ResetPasswordRequest};
use crate::modules::users::model::{
    LoginRequest, LoginResponse, MessageResponse, PublicUser, RegisterRequestDto,
    RegisterResponse, RegisteredUser, ResendOtpRequest, VerifyOtpRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::users::controller::register_user,
        crate::modules::users::controller::verify_email_otp,
        crate::modules::users::controller::resend_email_otp,
        crate::modules::users::controller::login_user,
        crate::modules::users::controller::get_me,
        crate::modules::auth::controller::google_oauth,
        crate::modules::auth::controller::github_oauth,
        crate::modules::auth::controller::refresh_access_token,
        crate::modules::auth::controller::logout_user,
        crate::modules::password::controller::forgot_password,
        crate::modules::password::controller::reset_password,
    ),
    components(
        schemas(
            PublicUser,
            RegisterRequestDto,
            RegisteredUser,
            RegisterResponse,
            VerifyOtpRequest,
            ResendOtpRequest,
            LoginRequest,
            LoginResponse,
            MessageResponse,
            GoogleSyncRequest,
            GithubSyncRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Registration, verification, and login"),
        (name = "OAuth", description = "Federated sign-in and session lifecycle"),
        (name = "Password", description = "Password reset")
    ),
    info(
        title = "Authgate API",
        description = "Authentication backend: registration with email OTP verification, credential and OAuth sign-in, rotating refresh tokens, and password reset.",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
