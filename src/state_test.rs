use super::*;

#[test]
fn cookie_key_is_deterministic_for_a_secret() {
    let a = cookie_key("a-long-enough-secret-for-signing-cookies");
    let b = cookie_key("a-long-enough-secret-for-signing-cookies");
    assert_eq!(a.master(), b.master());
}

#[test]
fn cookie_key_differs_between_secrets() {
    let a = cookie_key("first-secret-first-secret-first-secret");
    let b = cookie_key("second-secret-second-secret-second-secret");
    assert_ne!(a.master(), b.master());
}

#[tokio::test]
async fn key_is_extractable_from_state() {
    let state = test_helpers::test_app_state();
    let key = Key::from_ref(&state);
    assert_eq!(key.master(), cookie_key(test_helpers::TEST_SECRET).master());
}

#[tokio::test]
async fn state_copies_session_settings_from_config() {
    let state = test_helpers::test_app_state();
    assert_eq!(state.session_ttl, Duration::from_secs(3600));
    assert!(!state.cookie_secure);
    assert_eq!(state.environment, Environment::Production);
}
