//! End-to-end tests against an in-process axum backend over real HTTP.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use elimu::protocol::Role;
use elimu::{ApiClient, ClientConfig, Error, FileStore, KeyValueStore, MemoryStore, SessionManager};
use serde_json::{Value, json};

struct Backend {
	/// Access token the backend currently accepts.
	valid_access: Mutex<Option<String>>,
	refreshes: AtomicUsize,
	logouts: AtomicUsize,
}

type Shared = Arc<Backend>;

fn user_json() -> Value {
	json!({
		"id": 7,
		"username": "amina",
		"email": "amina@example.com",
		"role": "student",
		"full_name": "Amina Njeri",
		"is_verified": true
	})
}

fn bearer(headers: &HeaderMap) -> Option<String> {
	headers
		.get(header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.map(str::to_string)
}

fn authorized(backend: &Backend, headers: &HeaderMap) -> bool {
	let valid = backend.valid_access.lock().unwrap().clone();
	valid.is_some() && bearer(headers) == valid
}

async fn login(State(backend): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
	if body["username"] == "amina" && body["password"] == "secret" {
		*backend.valid_access.lock().unwrap() = Some("A1".into());
		(StatusCode::OK, Json(json!({ "access": "A1", "refresh": "R1", "user": user_json() })))
	} else {
		(
			StatusCode::UNAUTHORIZED,
			Json(json!({ "detail": "No active account found with the given credentials" })),
		)
	}
}

async fn refresh(State(backend): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
	backend.refreshes.fetch_add(1, Ordering::SeqCst);
	tokio::time::sleep(Duration::from_millis(50)).await;
	if body["refresh"] == "R1" {
		*backend.valid_access.lock().unwrap() = Some("A2".into());
		(StatusCode::OK, Json(json!({ "access": "A2" })))
	} else {
		(
			StatusCode::UNAUTHORIZED,
			Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
		)
	}
}

async fn logout(State(backend): State<Shared>) -> impl IntoResponse {
	backend.logouts.fetch_add(1, Ordering::SeqCst);
	(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn courses(State(backend): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
	if authorized(&backend, &headers) {
		(StatusCode::OK, Json(json!([{ "id": 1, "title": "Algebra" }])))
	} else {
		(StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Given token not valid for any token type" })))
	}
}

async fn spawn_backend() -> (Shared, SocketAddr) {
	let backend = Arc::new(Backend {
		valid_access: Mutex::new(None),
		refreshes: AtomicUsize::new(0),
		logouts: AtomicUsize::new(0),
	});
	let api = Router::new()
		.route("/auth/login", post(login))
		.route("/auth/refresh", post(refresh))
		.route("/auth/logout", post(logout))
		.route("/courses", get(courses))
		.route("/lessons", get(courses))
		.with_state(backend.clone());
	let app = Router::new().nest("/api/v1", api);

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	(backend, addr)
}

fn session_for(addr: SocketAddr, store: Arc<dyn KeyValueStore>) -> Arc<SessionManager> {
	let config = ClientConfig::new(&format!("http://{addr}/api/v1")).unwrap().with_timeout(Duration::from_secs(5));
	Arc::new(SessionManager::with_http(config, store).unwrap())
}

fn expire_access_token(backend: &Backend) {
	*backend.valid_access.lock().unwrap() = None;
}

#[tokio::test]
async fn login_then_recover_from_expired_access_token() -> anyhow::Result<()> {
	let (backend, addr) = spawn_backend().await;
	let session = session_for(addr, Arc::new(MemoryStore::new()));
	let client = ApiClient::new(session.clone());

	session.login("amina", "secret").await?;
	assert!(session.is_student());
	assert!(!session.has_role(Role::Instructor));

	let courses: Value = client.get_json("courses").await?;
	assert_eq!(courses[0]["title"], "Algebra");
	assert_eq!(backend.refreshes.load(Ordering::SeqCst), 0);

	expire_access_token(&backend);
	let courses: Value = client.get_json("courses").await?;
	assert_eq!(courses[0]["title"], "Algebra");
	assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
	assert_eq!(session.access_token().as_deref(), Some("A2"));
	assert_eq!(session.stored_refresh_token().as_deref(), Some("R1"));
	Ok(())
}

#[tokio::test]
async fn concurrent_expired_requests_share_one_refresh() -> anyhow::Result<()> {
	let (backend, addr) = spawn_backend().await;
	let session = session_for(addr, Arc::new(MemoryStore::new()));
	let client = ApiClient::new(session.clone());
	session.login("amina", "secret").await?;
	expire_access_token(&backend);

	let (courses, lessons, again) = tokio::join!(client.get("courses"), client.get("lessons"), client.get("courses"));

	courses?;
	lessons?;
	again?;
	assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
	Ok(())
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
	let (_backend, addr) = spawn_backend().await;
	let session = session_for(addr, Arc::new(MemoryStore::new()));

	let err = session.login("amina", "guess").await.unwrap_err();

	assert!(matches!(err, Error::InvalidCredentials(ref m) if m == "No active account found with the given credentials"));
	assert!(!session.is_authenticated());
}

#[tokio::test]
async fn logout_clears_persisted_session_despite_server_error() -> anyhow::Result<()> {
	let (backend, addr) = spawn_backend().await;
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("session.json");
	let session = session_for(addr, Arc::new(FileStore::open(&path)));

	session.login("amina", "secret").await?;
	assert_eq!(FileStore::open(&path).get("access_token").as_deref(), Some("A1"));

	session.logout().await;

	assert_eq!(backend.logouts.load(Ordering::SeqCst), 1);
	assert!(!session.is_authenticated());
	assert_eq!(session.current_user(), None);
	let reopened = FileStore::open(&path);
	assert_eq!(reopened.get("access_token"), None);
	assert_eq!(reopened.get("refresh_token"), None);
	assert_eq!(reopened.get("user"), None);
	Ok(())
}

#[tokio::test]
async fn revoked_refresh_token_expires_session() {
	let (backend, addr) = spawn_backend().await;
	let store = Arc::new(MemoryStore::new());
	store
		.set_many(&[("access_token", "stale"), ("refresh_token", "revoked"), ("user", &user_json().to_string())])
		.unwrap();
	let session = session_for(addr, store.clone());
	let client = ApiClient::new(session.clone());

	let err = client.get("courses").await.unwrap_err();

	assert!(matches!(err, Error::AuthExpired(_)));
	assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
	assert!(store.is_empty());
	assert_eq!(session.current_user(), None);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);
	let session = session_for(addr, Arc::new(MemoryStore::new()));

	let err = session.login("amina", "secret").await.unwrap_err();

	assert!(err.is_network());
	assert!(err.to_string().starts_with("No response from server."));
}
