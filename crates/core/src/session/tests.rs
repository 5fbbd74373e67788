use std::sync::Arc;
use std::time::Duration;

use elimu_protocol::{RegisterRequest, Role, User};
use serde_json::json;

use super::*;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::http::{FakeDispatcher, FakeReply};
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::test_support::{sample_user, sample_user_json, signed_in_store};

fn manager(store: Arc<MemoryStore>) -> (Arc<FakeDispatcher>, SessionManager) {
	manager_over(store)
}

fn manager_over(store: Arc<dyn KeyValueStore>) -> (Arc<FakeDispatcher>, SessionManager) {
	let fake = Arc::new(FakeDispatcher::new());
	let session = SessionManager::new(ClientConfig::default(), store, fake.clone());
	(fake, session)
}

fn registration() -> RegisterRequest {
	RegisterRequest {
		username: "baraka".into(),
		email: "baraka@example.com".into(),
		password: "pa55word!".into(),
		password2: "pa55word!".into(),
		role: Role::Instructor,
		first_name: Some("Baraka".into()),
		last_name: None,
		country: None,
	}
}

#[tokio::test]
async fn login_stores_tokens_and_profile() {
	let store = Arc::new(MemoryStore::new());
	let (fake, session) = manager(store.clone());
	fake.respond("auth/login", 200, json!({ "access": "A1", "refresh": "R1", "user": sample_user_json() }));

	let auth = session.login("amina", "secret").await.unwrap();

	assert_eq!(auth.access, "A1");
	assert_eq!(fake.sent_to("auth/login")[0].body, Some(json!({ "username": "amina", "password": "secret" })));
	assert_eq!(fake.sent_to("auth/login")[0].bearer, None);
	assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
	assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
	assert!(session.is_authenticated());
	assert!(session.is_student());
	assert!(!session.is_instructor());
	assert_eq!(session.current_user(), Some(sample_user()));
	assert_eq!(session.state(), SessionState::Authenticated(sample_user()));
}

#[tokio::test]
async fn rejected_login_stores_nothing() {
	let store = Arc::new(MemoryStore::new());
	let (fake, session) = manager(store.clone());
	fake.respond("auth/login", 401, json!({ "detail": "No active account found with the given credentials" }));

	let err = session.login("amina", "wrong").await.unwrap_err();

	match err {
		Error::InvalidCredentials(message) => assert_eq!(message, "No active account found with the given credentials"),
		other => panic!("unexpected error: {other:?}"),
	}
	assert!(store.is_empty());
	assert!(!session.is_authenticated());
}

#[tokio::test]
async fn login_server_error_keeps_status() {
	let (fake, session) = manager(Arc::new(MemoryStore::new()));
	fake.respond("auth/login", 500, json!({ "error": "database unavailable" }));

	let err = session.login("amina", "secret").await.unwrap_err();
	assert_eq!(err.status(), Some(500));
	assert_eq!(err.to_string(), "HTTP 500: database unavailable");
}

#[tokio::test]
async fn login_network_failure_is_reported_as_network() {
	let store = Arc::new(MemoryStore::new());
	let (fake, session) = manager(store.clone());
	fake.enqueue("auth/login", FakeReply::network_failure("connection refused"));

	let err = session.login("amina", "secret").await.unwrap_err();
	assert!(err.is_network());
	assert!(store.is_empty());
}

#[tokio::test]
async fn register_with_tokens_starts_a_session() {
	let store = Arc::new(MemoryStore::new());
	let (fake, session) = manager(store.clone());
	let mut user = sample_user();
	user.username = "baraka".into();
	user.role = Role::Instructor;
	fake.respond(
		"auth/register",
		201,
		json!({ "user": user, "message": "Registration successful", "tokens": { "access": "A9", "refresh": "R9" } }),
	);

	let registered = session.register(&registration()).await.unwrap();

	assert_eq!(registered.message.as_deref(), Some("Registration successful"));
	assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A9"));
	assert!(session.is_instructor());
	let sent = &fake.sent_to("auth/register")[0];
	assert_eq!(sent.body.as_ref().unwrap()["password2"], "pa55word!");
	assert_eq!(sent.body.as_ref().unwrap()["role"], "instructor");
}

#[tokio::test]
async fn register_without_tokens_requires_login() {
	let store = Arc::new(MemoryStore::new());
	let (fake, session) = manager(store.clone());
	fake.respond("auth/register", 201, json!({ "user": sample_user_json() }));

	session.register(&registration()).await.unwrap();

	assert!(store.is_empty());
	assert!(!session.is_authenticated());
}

#[tokio::test]
async fn register_validation_errors_keep_field_messages() {
	let (fake, session) = manager(Arc::new(MemoryStore::new()));
	fake.respond(
		"auth/register",
		400,
		json!({ "username": ["A user with that username already exists."], "password": ["This password is too common."] }),
	);

	let err = session.register(&registration()).await.unwrap_err();

	match err {
		Error::Validation { message, fields } => {
			assert_eq!(message, "A user with that username already exists.");
			assert_eq!(fields["password"], vec!["This password is too common.".to_string()]);
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn logout_revokes_then_clears() {
	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.respond("auth/logout", 205, serde_json::Value::Null);

	session.logout().await;

	let sent = &fake.sent_to("auth/logout")[0];
	assert_eq!(sent.body, Some(json!({ "refresh": "R1" })));
	assert_eq!(sent.bearer.as_deref(), Some("A1"));
	assert!(store.is_empty());
	assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn logout_clears_even_when_server_fails() {
	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.respond("auth/logout", 500, json!({ "detail": "boom" }));

	session.logout().await;
	assert!(store.is_empty());

	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.enqueue("auth/logout", FakeReply::network_failure("offline"));

	session.logout().await;
	assert!(store.is_empty());
	assert!(!session.is_authenticated());
}

#[tokio::test]
async fn logout_refreshes_expired_access_token_before_revoking() {
	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.route("auth/logout", |_, bearer| {
		if bearer == Some("A2") {
			FakeReply::json(205, serde_json::Value::Null)
		} else {
			FakeReply::json(401, json!({ "detail": "Given token not valid for any token type" }))
		}
	});
	fake.respond("auth/refresh", 200, json!({ "access": "A2", "refresh": "R2" }));

	session.logout().await;

	assert_eq!(fake.count("auth/refresh"), 1);
	let revokes = fake.sent_to("auth/logout");
	let bearers: Vec<_> = revokes.iter().map(|r| r.bearer.as_deref()).collect();
	assert_eq!(bearers, vec![Some("A1"), Some("A2")]);
	assert_eq!(revokes[1].body, Some(json!({ "refresh": "R2" })));
	assert!(store.is_empty());
	assert!(!session.is_authenticated());
}

#[tokio::test]
async fn logout_gives_up_after_one_retry() {
	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.route("auth/logout", |_, _| FakeReply::json(401, json!({ "detail": "nope" })));
	fake.route("auth/refresh", |_, _| FakeReply::ok(json!({ "access": "A2" })));

	session.logout().await;

	assert_eq!(fake.count("auth/logout"), 2);
	assert_eq!(fake.count("auth/refresh"), 1);
	assert!(store.is_empty());
}

#[tokio::test]
async fn logout_clears_session_even_when_store_write_fails() {
	let temp = tempfile::TempDir::new().unwrap();
	let path = temp.path().join("session.json");
	let store = Arc::new(FileStore::open(&path));
	let (fake, session) = manager_over(store);
	fake.respond("auth/login", 200, json!({ "access": "A1", "refresh": "R1", "user": sample_user_json() }));
	fake.route("auth/logout", |_, _| FakeReply::json(205, serde_json::Value::Null));
	session.login("amina", "secret").await.unwrap();

	// A non-empty directory in place of the file makes every write fail.
	std::fs::remove_file(&path).unwrap();
	std::fs::create_dir(&path).unwrap();
	std::fs::write(path.join("keep"), "x").unwrap();

	session.logout().await;

	assert!(!session.is_authenticated());
	assert_eq!(session.current_user(), None);
	assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn logout_without_refresh_token_skips_network() {
	let store = Arc::new(MemoryStore::new());
	store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
	let (fake, session) = manager(store.clone());

	session.logout().await;

	assert!(fake.sent().is_empty());
	assert!(store.is_empty());
}

#[tokio::test]
async fn refresh_replaces_access_token_only() {
	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.respond("auth/refresh", 200, json!({ "access": "A2" }));

	assert_eq!(session.refresh_token().await.as_deref(), Some("A2"));

	assert_eq!(fake.sent_to("auth/refresh")[0].body, Some(json!({ "refresh": "R1" })));
	assert_eq!(fake.sent_to("auth/refresh")[0].bearer, None);
	assert_eq!(session.access_token().as_deref(), Some("A2"));
	assert_eq!(session.stored_refresh_token().as_deref(), Some("R1"));
	assert_eq!(session.current_user(), Some(sample_user()));
}

#[tokio::test]
async fn refresh_stores_rotated_refresh_token() {
	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.respond("auth/refresh", 200, json!({ "access": "A2", "refresh": "R2" }));

	session.refresh_token().await.unwrap();
	assert_eq!(session.stored_refresh_token().as_deref(), Some("R2"));
}

#[tokio::test]
async fn invalid_refresh_token_clears_session() {
	let store = signed_in_store("A1", "R1");
	let (fake, session) = manager(store.clone());
	fake.respond("auth/refresh", 401, json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }));
	let mut state = session.subscribe();

	assert_eq!(session.refresh_token().await, None);

	assert!(store.is_empty());
	assert_eq!(session.current_user(), None);
	assert!(!session.is_authenticated());
	assert!(state.has_changed().unwrap());
	assert_eq!(*state.borrow_and_update(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn refresh_without_refresh_token_makes_no_call() {
	let (fake, session) = manager(Arc::new(MemoryStore::new()));

	assert_eq!(session.refresh_token().await, None);
	assert!(fake.sent().is_empty());
}

#[tokio::test]
async fn concurrent_refreshes_share_one_exchange() {
	let (fake, session) = manager(signed_in_store("A1", "R1"));
	fake.enqueue("auth/refresh", FakeReply::ok(json!({ "access": "A2", "refresh": "R2" })).delayed(Duration::from_millis(30)));

	let (a, b, c) = tokio::join!(session.refresh_token(), session.refresh_token(), session.refresh_token());

	assert_eq!(fake.count("auth/refresh"), 1);
	assert_eq!(a.as_deref(), Some("A2"));
	assert_eq!(b, a);
	assert_eq!(c, a);
}

#[tokio::test]
async fn cancelled_leader_hands_refresh_to_waiter() {
	let (fake, session) = manager(signed_in_store("A1", "R1"));
	fake.enqueue("auth/refresh", FakeReply::ok(json!({ "access": "lost" })).delayed(Duration::from_secs(60)));
	fake.enqueue("auth/refresh", FakeReply::ok(json!({ "access": "A2" })));

	let mut leader = Box::pin(session.refresh_token());
	let mut follower = Box::pin(session.refresh_token());

	// Start the leader, park the follower, then abandon the leader.
	assert!(poll_once(leader.as_mut()).await.is_none());
	assert!(poll_once(follower.as_mut()).await.is_none());
	drop(leader);

	assert_eq!(follower.await.as_deref(), Some("A2"));
	assert_eq!(fake.count("auth/refresh"), 2);
}

async fn poll_once<F: std::future::Future + Unpin>(future: F) -> Option<F::Output> {
	tokio::select! {
		biased;
		out = future => Some(out),
		_ = std::future::ready(()) => None,
	}
}

#[test]
fn corrupt_profile_reads_as_absent() {
	let store = signed_in_store("A1", "R1");
	store.set(USER_KEY, "{not json").unwrap();
	let (_, session) = manager(store);

	assert_eq!(session.current_user(), None);
	assert_eq!(session.user_role(), None);
	assert!(!session.is_student());
	assert!(session.is_authenticated());
}

#[test]
fn role_predicates_follow_cached_profile() {
	let (_, session) = manager(signed_in_store("A1", "R1"));
	for role in [Role::Student, Role::Instructor, Role::Partner, Role::Admin] {
		let user = User { role, ..sample_user() };
		session.update_user_data(user).unwrap();
		assert!(session.has_role(role));
		assert_eq!(session.is_student(), role == Role::Student);
		assert_eq!(session.is_instructor(), role == Role::Instructor);
		assert_eq!(session.is_partner(), role == Role::Partner);
		assert_eq!(session.is_admin(), role == Role::Admin);
	}
}

#[test]
fn update_user_data_round_trips_without_touching_tokens() {
	let store = signed_in_store("A1", "R1");
	let (_, session) = manager(store.clone());
	let user = User {
		bio: Some("Maths tutor".into()),
		..sample_user()
	};

	session.update_user_data(user.clone()).unwrap();

	assert_eq!(session.current_user(), Some(user.clone()));
	assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
	assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
	assert_eq!(session.state(), SessionState::Authenticated(user));
}

#[test]
fn update_user_data_requires_a_session() {
	let store = Arc::new(MemoryStore::new());
	let (_, session) = manager(store.clone());

	let err = session.update_user_data(sample_user()).unwrap_err();
	assert!(matches!(err, Error::NotAuthenticated));
	assert!(store.is_empty());
}

#[test]
fn hydrate_publishes_stored_state() {
	let (_, session) = manager(signed_in_store("A1", "R1"));
	assert!(session.state().is_loading());
	assert_eq!(session.hydrate(), SessionState::Authenticated(sample_user()));

	let store = Arc::new(MemoryStore::new());
	store.set(USER_KEY, &serde_json::to_string(&sample_user()).unwrap()).unwrap();
	let (_, session) = manager(store);
	assert_eq!(session.hydrate(), SessionState::Unauthenticated);
}
