//! End-to-end: the client SDK against a live server instance, cookies and
//! all, over a real TCP socket.

mod common;

use authgate::config::session::SessionMode;
use authgate::utils::password::hash_password;
use authgate_client::{AuthApi, AuthContext};
use common::{generate_unique_email, setup_test_app};
use sqlx::PgPool;

async fn spawn_server(pool: PgPool, mode: SessionMode) -> String {
    let app = setup_test_app(pool, mode);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[sqlx::test(migrations = "./migrations")]
async fn test_full_lifecycle_through_client(pool: PgPool) {
    let base_url = spawn_server(pool.clone(), SessionMode::Rotating).await;

    let api = AuthApi::new(base_url).unwrap();
    let mut auth = AuthContext::new(api);

    // Cold start: no cookies, bootstrap lands logged out without error.
    auth.bootstrap().await;
    assert!(!auth.is_authenticated());
    assert!(auth.error().is_none());

    let email = generate_unique_email();
    let outcome = auth.register("Ada", &email, "Passw0rd1").await;
    assert!(outcome.success, "{}", outcome.message);
    assert!(outcome.needs_verification);
    let user_id = outcome.user_id.unwrap();

    // Login is refused until the code is verified.
    let outcome = auth.login(&email, "Passw0rd1").await;
    assert!(!outcome.success);
    assert_eq!(
        outcome.message,
        "Email not verified. Please verify your email first."
    );

    // Swap in a known code, then verify through the client.
    sqlx::query("UPDATE email_otps SET otp_hash = $1 WHERE user_id = $2")
        .bind(hash_password("123456").unwrap())
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = auth.verify_otp(user_id, &email, "123456").await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.message, "Email verified successfully!");

    let outcome = auth.login(&email, "Passw0rd1").await;
    assert!(outcome.success, "{}", outcome.message);
    assert!(auth.is_authenticated());
    assert_eq!(auth.user().unwrap().email, email);

    // The cached access token authenticates the profile endpoint.
    let me = auth.api().me().await.unwrap();
    assert_eq!(me.email, email);

    // The cookie store carried the refresh cookie; rotation works.
    let refreshed = auth.api().refresh_access_token().await.unwrap();
    assert_eq!(refreshed.user.email, email);

    let outcome = auth.logout().await;
    assert!(outcome.success, "{}", outcome.message);
    assert!(!auth.is_authenticated());

    // The revoked, cleared cookie can no longer refresh.
    assert!(auth.api().refresh_access_token().await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_client_against_stateless_server(pool: PgPool) {
    let base_url = spawn_server(pool.clone(), SessionMode::Stateless).await;

    let api = AuthApi::new(base_url).unwrap();
    let mut auth = AuthContext::new(api);

    let email = generate_unique_email();
    common::create_test_user(&pool, &email, "Passw0rd1", true).await;

    let outcome = auth.login(&email, "Passw0rd1").await;
    assert!(outcome.success, "{}", outcome.message);

    // Refresh rides on the signed session cookie; nothing stored server side.
    let refreshed = auth.api().refresh_access_token().await.unwrap();
    assert_eq!(refreshed.user.email, email);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}
