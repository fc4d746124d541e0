use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{get_me, login_user, register_user, resend_email_otp, verify_email_otp};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/verify-otp", post(verify_email_otp))
        .route("/resend-otp", post(resend_email_otp))
        .route("/login", post(login_user))
        .route("/me", get(get_me))
}
