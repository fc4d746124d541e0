use authgate::config::jwt::JwtConfig;
use authgate::utils::jwt::{create_access_token, verify_access_token};
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

#[test]
fn test_create_access_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let result = create_access_token(user_id, "test@example.com", &jwt_config);

    assert!(result.is_ok());
    let token = result.unwrap();
    assert!(!token.is_empty());
}

#[test]
fn test_verify_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let email = "test@example.com";

    let token = create_access_token(user_id, email, &jwt_config).unwrap();
    let result = verify_access_token(&token, &jwt_config);

    assert!(result.is_ok());
    let claims = result.unwrap();
    assert_eq!(claims.email, email);
    assert_eq!(claims.sub, user_id.to_string());
}

#[test]
fn test_verify_token_invalid() {
    let jwt_config = get_test_jwt_config();

    let result = verify_access_token("invalid.token.here", &jwt_config);

    assert!(result.is_err());
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(user_id, "test@example.com", &jwt_config).unwrap();

    let wrong_jwt_config = JwtConfig {
        secret: "different_secret_key".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    };

    let result = verify_access_token(&token, &wrong_jwt_config);

    assert!(result.is_err());
}

#[test]
fn test_verify_token_empty() {
    let jwt_config = get_test_jwt_config();

    let result = verify_access_token("", &jwt_config);

    assert!(result.is_err());
}

#[test]
fn test_token_expiry_is_set() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(user_id, "test@example.com", &jwt_config).unwrap();
    let claims = verify_access_token(&token, &jwt_config).unwrap();

    assert!(claims.exp > claims.iat);
    assert_eq!(
        claims.exp - claims.iat,
        jwt_config.access_token_expiry as usize
    );
}

#[test]
fn test_token_with_special_characters_in_email() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let email = "test+special@example.co.uk";

    let token = create_access_token(user_id, email, &jwt_config).unwrap();
    let claims = verify_access_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.email, email);
}

#[test]
fn test_verify_token_malformed() {
    let jwt_config = get_test_jwt_config();
    let malformed_tokens = vec![
        "not.enough.parts",
        "too.many.parts.here.extra",
        "!!!.invalid.chars",
        "header.payload.",
        ".payload.signature",
    ];

    for token in malformed_tokens {
        let result = verify_access_token(token, &jwt_config);
        assert!(result.is_err());
    }
}

#[test]
fn test_create_token_different_users_different_tokens() {
    let jwt_config = get_test_jwt_config();
    let user_id1 = Uuid::new_v4();
    let user_id2 = Uuid::new_v4();

    let token1 = create_access_token(user_id1, "user1@example.com", &jwt_config).unwrap();
    let token2 = create_access_token(user_id2, "user2@example.com", &jwt_config).unwrap();

    assert_ne!(token1, token2);

    let claims1 = verify_access_token(&token1, &jwt_config).unwrap();
    let claims2 = verify_access_token(&token2, &jwt_config).unwrap();

    assert_eq!(claims1.sub, user_id1.to_string());
    assert_eq!(claims2.sub, user_id2.to_string());
}
