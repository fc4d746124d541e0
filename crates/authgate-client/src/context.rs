//! Application-facing auth state.
//!
//! `AuthContext` is the single source of truth for who is signed in. It is
//! driven by UI events from one task at a time (`&mut self`), so there is
//! no locking here; the thread-safe pieces live in [`AuthApi`].
//!
//! Every action follows the same contract: set `loading`, call the API,
//! normalize the result into an [`ActionOutcome`], clear `loading`.
//! Failures come back as values, never as `Err`, so a form can render the
//! message inline without unwinding.

use uuid::Uuid;

use crate::api::AuthApi;
use crate::error::ClientError;
use crate::types::{
    AuthUser, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResendOtpRequest,
    ResetPasswordRequest, VerifyOtpRequest,
};

/// Normalized result of an auth action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    /// Set by `register`: the account exists but needs OTP verification.
    pub needs_verification: bool,
    /// Set by `register`: id to feed into `verify_otp`/`resend_otp`.
    pub user_id: Option<Uuid>,
}

impl ActionOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            needs_verification: false,
            user_id: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            needs_verification: false,
            user_id: None,
        }
    }
}

pub struct AuthContext {
    api: AuthApi,
    user: Option<AuthUser>,
    loading: bool,
    error: Option<String>,
}

impl AuthContext {
    pub fn new(api: AuthApi) -> Self {
        Self {
            api,
            user: None,
            loading: false,
            error: None,
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn api(&self) -> &AuthApi {
        &self.api
    }

    /// Silent session restoration, run once at startup.
    ///
    /// A failure is not an error state: no valid refresh cookie simply
    /// means the user is logged out.
    pub async fn bootstrap(&mut self) {
        self.loading = true;
        self.error = None;

        match self.api.refresh_access_token().await {
            Ok(session) => self.user = Some(session.user),
            Err(_) => self.user = None,
        }

        self.loading = false;
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> ActionOutcome {
        self.begin();

        let result = self
            .api
            .register(&RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await;

        match result {
            Ok(response) => {
                self.finish();
                ActionOutcome {
                    success: true,
                    message: response.message,
                    needs_verification: true,
                    user_id: Some(response.user.id),
                }
            }
            Err(err) => self.fail(err, "Registration failed"),
        }
    }

    pub async fn verify_otp(&mut self, user_id: Uuid, email: &str, otp: &str) -> ActionOutcome {
        self.begin();

        let result = self
            .api
            .verify_otp(&VerifyOtpRequest {
                otp: otp.to_string(),
                email: email.to_string(),
                user_id,
            })
            .await;

        match result {
            Ok(response) => {
                self.finish();
                ActionOutcome::ok(response.message)
            }
            Err(err) => self.fail(err, "Verification failed"),
        }
    }

    pub async fn resend_otp(&mut self, user_id: Uuid, email: &str) -> ActionOutcome {
        self.begin();

        let result = self
            .api
            .resend_otp(&ResendOtpRequest {
                email: email.to_string(),
                user_id,
            })
            .await;

        match result {
            Ok(response) => {
                self.finish();
                ActionOutcome::ok(response.message)
            }
            Err(err) => self.fail(err, "Failed to resend OTP"),
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ActionOutcome {
        self.begin();

        let result = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await;

        match result {
            Ok(response) => {
                self.user = Some(response.user);
                self.finish();
                ActionOutcome::ok("Login successful")
            }
            Err(err) => self.fail(err, "Login failed"),
        }
    }

    /// Logs out locally no matter what the server says; a dead network
    /// must not keep a session alive on this side.
    pub async fn logout(&mut self) -> ActionOutcome {
        self.begin();

        let result = self.api.logout().await;
        self.user = None;

        match result {
            Ok(response) => {
                self.finish();
                ActionOutcome::ok(response.message)
            }
            Err(err) => self.fail(err, "Logout failed"),
        }
    }

    pub async fn request_password_reset(&mut self, email: &str) -> ActionOutcome {
        self.begin();

        let result = self
            .api
            .request_password_reset(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .await;

        match result {
            Ok(response) => {
                self.finish();
                ActionOutcome::ok(response.message)
            }
            Err(err) => self.fail(err, "Failed to send reset email"),
        }
    }

    pub async fn reset_password(
        &mut self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> ActionOutcome {
        self.begin();

        let result = self
            .api
            .reset_password(&ResetPasswordRequest {
                token: token.to_string(),
                email: email.to_string(),
                new_password: new_password.to_string(),
            })
            .await;

        match result {
            Ok(response) => {
                self.finish();
                ActionOutcome::ok(response.message)
            }
            Err(err) => self.fail(err, "Password reset failed"),
        }
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self) {
        self.loading = false;
    }

    fn fail(&mut self, err: ClientError, fallback: &str) -> ActionOutcome {
        let mut message = err.user_message();
        if message == "Request failed" {
            message = fallback.to_string();
        }
        self.error = Some(message.clone());
        self.loading = false;
        ActionOutcome::failed(message)
    }
}
