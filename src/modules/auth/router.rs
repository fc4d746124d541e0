use crate::state::AppState;
use axum::{Router, routing::post};

use super::controller::{github_oauth, google_oauth, logout_user, refresh_access_token};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/google", post(google_oauth))
        .route("/github", post(github_oauth))
        .route("/refresh", post(refresh_access_token))
        .route("/logout", post(logout_user))
}
