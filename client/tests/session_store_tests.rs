use std::sync::Arc;

use courtfinder_client::error::ClientError;
use courtfinder_client::session::{
    require_session, FileTokenStore, SessionContext, TokenStore, UserProfile,
};

#[test]
fn test_session_survives_restart_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");

    {
        let store = Arc::new(FileTokenStore::new(&path));
        let mut session = SessionContext::init(store).unwrap();
        assert!(!session.is_signed_in());
        session.login("tok-123", None).unwrap();
    }

    let store = Arc::new(FileTokenStore::new(&path));
    let session = SessionContext::init(store).unwrap();
    assert_eq!(require_session(&session).unwrap(), "tok-123");
    // The profile is not persisted
    assert!(session.profile().is_none());
}

#[test]
fn test_logout_removes_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let store = Arc::new(FileTokenStore::new(&path));
    let mut session = SessionContext::init(store.clone()).unwrap();

    let profile: UserProfile =
        serde_json::from_str(r#"{"_id": "u1", "email": "p@example.com"}"#).unwrap();
    session.login("tok", Some(profile)).unwrap();
    assert!(path.exists());
    assert_eq!(
        session.profile().and_then(|p| p.email.as_deref()),
        Some("p@example.com")
    );

    session.logout().unwrap();
    assert!(!path.exists());
    assert!(session.profile().is_none());
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_token_file_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    FileTokenStore::new(&path).save("abc").unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["access_token"], "abc");
    assert!(raw["saved_at"].is_string());
}

#[test]
fn test_unreadable_store_fails_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    std::fs::write(&path, "garbage").unwrap();

    let err = SessionContext::init(Arc::new(FileTokenStore::new(&path))).unwrap_err();
    assert!(matches!(err, ClientError::Storage { .. }));
}
