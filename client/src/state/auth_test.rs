use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;

fn user(id: i64, username: &str) -> SerializedUser {
    SerializedUser {
        id,
        email: format!("{username}@example.com"),
        username: username.to_owned(),
        activated: true,
    }
}

// =========================================================================
// MockUserApi
// =========================================================================

/// Replays queued results and records whether the store reported loading
/// while each call was in flight.
#[derive(Default)]
struct MockUserApi {
    users: Mutex<VecDeque<Result<Option<SerializedUser>, ClientError>>>,
    logouts: Mutex<VecDeque<Result<(), ClientError>>>,
    observer: Mutex<Option<watch::Receiver<AuthState>>>,
    loading_seen: Mutex<Vec<bool>>,
}

impl MockUserApi {
    fn with_users(users: Vec<Result<Option<SerializedUser>, ClientError>>) -> Self {
        Self { users: Mutex::new(users.into()), ..Self::default() }
    }

    fn record_loading(&self) {
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            self.loading_seen.lock().unwrap().push(rx.borrow().user_loading);
        }
    }
}

#[async_trait::async_trait]
impl UserApi for MockUserApi {
    async fn get_logged_in_user(&self) -> Result<Option<SerializedUser>, ClientError> {
        self.record_loading();
        let next = self.users.lock().unwrap().pop_front();
        next.unwrap_or(Ok(None))
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.record_loading();
        let next = self.logouts.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }
}

fn store_with(api: MockUserApi) -> (Arc<MockUserApi>, AuthStore) {
    let api = Arc::new(api);
    let store = AuthStore::new(api.clone());
    *api.observer.lock().unwrap() = Some(store.subscribe());
    (api, store)
}

// =========================================================================
// Initial state
// =========================================================================

#[test]
fn new_store_is_unchecked_and_idle() {
    let (_, store) = store_with(MockUserApi::default());
    assert_eq!(store.snapshot(), AuthState::default());
    assert_eq!(store.snapshot().user, UserState::Unchecked);
}

#[test]
fn hydrated_store_starts_from_server_payload() {
    let store = AuthStore::hydrate(
        Arc::new(MockUserApi::default()),
        InitialAuthData { user: Some(user(1, "alice")) },
    );
    assert_eq!(store.snapshot().user, UserState::LoggedIn(user(1, "alice")));

    let anonymous = AuthStore::hydrate(Arc::new(MockUserApi::default()), InitialAuthData::default());
    assert_eq!(anonymous.snapshot().user, UserState::LoggedOut);
}

#[test]
fn initial_data_tolerates_missing_user_field() {
    let data: InitialAuthData = serde_json::from_str("{}").expect("decode");
    assert_eq!(data, InitialAuthData::default());
}

// =========================================================================
// refresh_user / logout
// =========================================================================

#[tokio::test]
async fn refresh_sets_user_and_clears_loading() {
    let (api, store) = store_with(MockUserApi::with_users(vec![Ok(Some(user(1, "alice")))]));
    let returned = store.refresh_user().await.expect("refresh");

    assert_eq!(returned, Some(user(1, "alice")));
    let state = store.snapshot();
    assert_eq!(state.user, UserState::LoggedIn(user(1, "alice")));
    assert!(!state.user_loading);
    assert!(state.user_error.is_none());
    assert_eq!(*api.loading_seen.lock().unwrap(), vec![true]);
}

#[tokio::test]
async fn refresh_of_anonymous_session_is_logged_out() {
    let (_, store) = store_with(MockUserApi::with_users(vec![Ok(None)]));
    assert_eq!(store.refresh_user().await.expect("refresh"), None);
    assert_eq!(store.snapshot().user, UserState::LoggedOut);
}

#[tokio::test]
async fn failed_refresh_records_error_and_returns_it() {
    let (_, store) = store_with(MockUserApi::with_users(vec![Err(ClientError::Status { status: 502 })]));
    let err = store.refresh_user().await.unwrap_err();

    let state = store.snapshot();
    assert_eq!(state.user_error.as_deref(), Some(err.to_string().as_str()));
    assert!(!state.user_loading);
    assert_eq!(state.user, UserState::Unchecked);
}

#[tokio::test]
async fn next_call_clears_previous_error() {
    let (_, store) = store_with(MockUserApi::with_users(vec![
        Err(ClientError::Request("connection reset".into())),
        Ok(Some(user(1, "alice"))),
    ]));
    store.refresh_user().await.unwrap_err();
    assert!(store.snapshot().user_error.is_some());

    store.refresh_user().await.expect("second refresh");
    let state = store.snapshot();
    assert!(state.user_error.is_none());
    assert!(!state.user_loading);
}

#[tokio::test]
async fn logout_forgets_user() {
    let (_, store) = store_with(MockUserApi::with_users(vec![Ok(Some(user(1, "alice")))]));
    store.refresh_user().await.expect("refresh");
    store.logout().await.expect("logout");
    let state = store.snapshot();
    assert_eq!(state.user, UserState::LoggedOut);
    assert!(!state.user_loading);
}

#[tokio::test]
async fn failed_logout_keeps_user_and_records_error() {
    let api = MockUserApi::with_users(vec![Ok(Some(user(1, "alice")))]);
    api.logouts.lock().unwrap().push_back(Err(ClientError::Status { status: 500 }));
    let (_, store) = store_with(api);

    store.refresh_user().await.expect("refresh");
    store.logout().await.unwrap_err();

    let state = store.snapshot();
    assert_eq!(state.user, UserState::LoggedIn(user(1, "alice")));
    assert_eq!(state.user_error.as_deref(), Some("unexpected response status 500"));
    assert!(!state.user_loading);
}

#[tokio::test]
async fn logout_then_refresh_toggles_loading_once_per_call() {
    let (api, store) = store_with(MockUserApi::with_users(vec![Ok(Some(user(3, "carol")))]));
    let mut rx = store.subscribe();

    store.logout().await.expect("logout");
    assert!(rx.has_changed().expect("sender alive"));
    assert!(!rx.borrow_and_update().user_loading);

    store.refresh_user().await.expect("refresh");
    assert!(rx.has_changed().expect("sender alive"));
    let state = rx.borrow_and_update().clone();
    assert!(!state.user_loading);
    assert_eq!(state.user, UserState::LoggedIn(user(3, "carol")));

    assert_eq!(*api.loading_seen.lock().unwrap(), vec![true, true]);
}

#[tokio::test]
async fn every_settlement_leaves_exactly_one_outcome() {
    let (_, store) = store_with(MockUserApi::with_users(vec![
        Ok(Some(user(1, "alice"))),
        Err(ClientError::Request("timeout".into())),
        Ok(None),
    ]));
    for _ in 0..3 {
        let result = store.refresh_user().await;
        let state = store.snapshot();
        assert!(!state.user_loading);
        assert_eq!(result.is_ok(), state.user_error.is_none());
    }
}

// =========================================================================
// Overlapping calls
// =========================================================================

/// Each call waits for the next queued result to be released by the test.
struct GatedUserApi {
    gates: Mutex<VecDeque<oneshot::Receiver<Option<SerializedUser>>>>,
}

#[async_trait::async_trait]
impl UserApi for GatedUserApi {
    async fn get_logged_in_user(&self) -> Result<Option<SerializedUser>, ClientError> {
        let gate = self.gates.lock().unwrap().pop_front().expect("queued gate");
        gate.await.map_err(|e| ClientError::Request(e.to_string()))
    }

    async fn logout(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

#[tokio::test]
async fn last_settled_refresh_wins() {
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let api = GatedUserApi { gates: Mutex::new(VecDeque::from([first_rx, second_rx])) };
    let store = Arc::new(AuthStore::new(Arc::new(api)));

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.refresh_user().await }
    });
    tokio::task::yield_now().await;
    let second = tokio::spawn({
        let store = store.clone();
        async move { store.refresh_user().await }
    });
    tokio::task::yield_now().await;

    second_tx.send(Some(user(2, "bob"))).expect("second gate");
    second.await.expect("join").expect("second refresh");
    assert_eq!(store.snapshot().user, UserState::LoggedIn(user(2, "bob")));

    first_tx.send(Some(user(1, "alice"))).expect("first gate");
    first.await.expect("join").expect("first refresh");
    let state = store.snapshot();
    assert_eq!(state.user, UserState::LoggedIn(user(1, "alice")));
    assert!(!state.user_loading);
}
