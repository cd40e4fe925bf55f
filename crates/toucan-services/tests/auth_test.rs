mod helpers;

use helpers::{MemoryStore, TEST_JWT_SECRET};
use toucan_core::AppError;
use toucan_services::{AuthService, Credentials};

fn service() -> AuthService {
    AuthService::new(MemoryStore::new(), TEST_JWT_SECRET, 24)
}

#[tokio::test]
async fn test_register_login_and_resolve_session() {
    let auth = service();
    let user = auth
        .register(Credentials::new("Ana@Example.com", "long enough"))
        .await
        .unwrap();
    assert_eq!(user.email, "ana@example.com");
    assert_ne!(user.password_hash, "long enough");

    let session = auth
        .login(Credentials::new("ana@example.com", "long enough"))
        .await
        .unwrap();
    assert_eq!(session.user_id, user.id);

    let resolved = auth.require_user(Some(&session.token)).unwrap();
    assert_eq!(resolved, user.id);
}

#[tokio::test]
async fn test_register_rejects_bad_input_and_duplicates() {
    let auth = service();
    let err = auth
        .register(Credentials::new("nope", "long enough"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = auth
        .register(Credentials::new("a@example.com", "short"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    auth.register(Credentials::new("a@example.com", "long enough"))
        .await
        .unwrap();
    let err = auth
        .register(Credentials::new("a@example.com", "other password"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let auth = service();
    auth.register(Credentials::new("a@example.com", "long enough"))
        .await
        .unwrap();

    let err = auth
        .login(Credentials::new("a@example.com", "not it at all"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = auth
        .login(Credentials::new("b@example.com", "long enough"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[test]
fn test_require_user_needs_valid_token() {
    let auth = service();
    match auth.require_user(None) {
        Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Login required"),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert!(auth.require_user(Some("  ")).is_err());
    assert!(auth.require_user(Some("not.a.jwt")).is_err());

    let other = AuthService::new(MemoryStore::new(), "another-secret-of-sufficient-length!", 24);
    let token = other.issue_session(uuid::Uuid::new_v4()).unwrap().token;
    assert!(matches!(
        auth.require_user(Some(&token)),
        Err(AppError::Unauthorized(_))
    ));
}

#[test]
fn test_expired_session_rejected() {
    let auth = AuthService::new(MemoryStore::new(), TEST_JWT_SECRET, -1);
    let token = auth.issue_session(uuid::Uuid::new_v4()).unwrap().token;
    assert!(auth.require_user(Some(&token)).is_err());
}
