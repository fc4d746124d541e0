use authgate::config::session::{SessionConfig, SessionMode};
use authgate::modules::users::model::User;
use authgate::utils::session::{SESSION_COOKIE, clear_session, create_session, verify_session};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use uuid::Uuid;

fn test_config() -> SessionConfig {
    SessionConfig {
        mode: SessionMode::Stateless,
        secret: "test_secret_key_for_testing_purposes".to_string(),
        max_age: 604800,
        production: false,
    }
}

fn test_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "a@x.com".to_string(),
        name: Some("Ada".to_string()),
        password: None,
        is_email_verified: true,
        avatar_url: None,
        role: "user".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_session_roundtrip() {
    let config = test_config();
    let user = test_user();

    let jar = create_session(&user, &config, CookieJar::new()).unwrap();

    let cookie = jar.get(SESSION_COOKIE).expect("session cookie set");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.secure(), Some(false));

    let session_user = verify_session(&jar, &config).expect("session verifies");
    assert_eq!(session_user.id, user.id);
    assert_eq!(session_user.email, user.email);
    assert_eq!(session_user.name, user.name);
    assert_eq!(session_user.role, "user");
}

#[test]
fn test_verify_session_missing_cookie() {
    let config = test_config();

    assert!(verify_session(&CookieJar::new(), &config).is_none());
}

#[test]
fn test_verify_session_wrong_secret() {
    let config = test_config();
    let user = test_user();

    let jar = create_session(&user, &config, CookieJar::new()).unwrap();

    let other = SessionConfig {
        secret: "a_completely_different_secret".to_string(),
        ..test_config()
    };

    assert!(verify_session(&jar, &other).is_none());
}

#[test]
fn test_verify_session_expired() {
    // Well past the verifier's clock leeway.
    let config = SessionConfig {
        max_age: -300,
        ..test_config()
    };
    let user = test_user();

    let jar = create_session(&user, &config, CookieJar::new()).unwrap();

    assert!(verify_session(&jar, &config).is_none());
}

#[test]
fn test_verify_session_garbage_cookie() {
    let config = test_config();
    let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "not-a-jwt"));

    assert!(verify_session(&jar, &config).is_none());
}

#[test]
fn test_session_cookies_append_not_overwrite() {
    let config = test_config();
    let user = test_user();

    let jar = CookieJar::new().add(Cookie::new("refreshToken", "keep-me"));
    let jar = create_session(&user, &config, jar).unwrap();

    assert_eq!(jar.get("refreshToken").unwrap().value(), "keep-me");
    assert!(jar.get(SESSION_COOKIE).is_some());
}

#[test]
fn test_clear_session_preserves_other_cookies() {
    let config = test_config();
    let user = test_user();

    let jar = CookieJar::new().add(Cookie::new("other", "value"));
    let jar = create_session(&user, &config, jar).unwrap();
    let jar = clear_session(jar);

    assert!(jar.get(SESSION_COOKIE).is_none());
    assert_eq!(jar.get("other").unwrap().value(), "value");
}
