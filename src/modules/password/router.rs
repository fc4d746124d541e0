use crate::state::AppState;
use axum::{Router, routing::post};

use super::controller::{forgot_password, reset_password};

pub fn init_password_router() -> Router<AppState> {
    Router::new()
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}
