mod common;

use authgate::config::session::SessionMode;
use axum::http::StatusCode;
use common::{
    body_json, create_test_user, generate_unique_email, json_request, seed_otp, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "./migrations")]
async fn test_otp_is_single_use(pool: PgPool) {
    let app = setup_test_app(pool.clone(), SessionMode::Rotating);

    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "Passw0rd1", false).await;
    seed_otp(&pool, user.id, &email, "123456", 15, 0).await;

    let request = json!({"otp": "123456", "email": email, "userId": user.id});

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/user/verify-otp", request.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Replay of an accepted code must fail.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/user/verify-otp", request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_otp_attempts_capped(pool: PgPool) {
    let app = setup_test_app(pool.clone(), SessionMode::Rotating);

    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "Passw0rd1", false).await;
    seed_otp(&pool, user.id, &email, "123456", 15, 0).await;

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/user/verify-otp",
                json!({"otp": "000000", "email": email, "userId": user.id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid OTP!");
    }

    // Sixth try is locked out even with the correct code.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user/verify-otp",
            json!({"otp": "123456", "email": email, "userId": user.id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_otp_rejected(pool: PgPool) {
    let app = setup_test_app(pool.clone(), SessionMode::Rotating);

    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "Passw0rd1", false).await;
    seed_otp(&pool, user.id, &email, "123456", -1, 0).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/user/verify-otp",
            json!({"otp": "123456", "email": email, "userId": user.id}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid or expired OTP!");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resend_invalidates_previous_code(pool: PgPool) {
    let app = setup_test_app(pool.clone(), SessionMode::Rotating);

    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "Passw0rd1", false).await;
    seed_otp(&pool, user.id, &email, "123456", 15, 0).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user/resend-otp",
            json!({"email": email, "userId": user.id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "New OTP sent successfully!");

    // The old emailed code must no longer verify.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user/verify-otp",
            json!({"otp": "123456", "email": email, "userId": user.id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resend_after_verified(pool: PgPool) {
    let app = setup_test_app(pool.clone(), SessionMode::Rotating);

    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "Passw0rd1", true).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/user/resend-otp",
            json!({"email": email, "userId": user.id}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Email already verified!");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resend_unknown_user(pool: PgPool) {
    let app = setup_test_app(pool.clone(), SessionMode::Rotating);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/user/resend-otp",
            json!({"email": "ghost@test.com", "userId": uuid::Uuid::new_v4()}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_marks_user_verified(pool: PgPool) {
    let app = setup_test_app(pool.clone(), SessionMode::Rotating);

    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "Passw0rd1", false).await;
    seed_otp(&pool, user.id, &email, "123456", 15, 0).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/user/verify-otp",
            json!({"otp": "123456", "email": email, "userId": user.id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let verified: bool = sqlx::query_scalar("SELECT is_email_verified FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(verified);
}
