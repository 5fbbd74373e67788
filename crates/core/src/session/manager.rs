//! Login lifecycle and token refresh over a [`CredentialStore`].

use std::sync::Arc;

use elimu_protocol::{AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest, RegisterResponse, Role, User};
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::credentials::{CredentialPair, CredentialStore};
use super::state::SessionState;
use crate::config::{ClientConfig, Endpoints};
use crate::error::{Error, Result, describe_error_body};
use crate::http::{ApiRequest, Dispatch, HttpDispatcher, RetryStep, StatusCode, next_step};
use crate::store::KeyValueStore;

/// Waiters parked on the refresh that is currently in flight.
///
/// `None` means no refresh is running. The task that flips it to `Some`
/// performs the exchange; everybody arriving meanwhile parks a sender here
/// and receives the leader's outcome.
type RefreshFlight = Mutex<Option<Vec<oneshot::Sender<Option<String>>>>>;

/// Owns the persisted session and every operation that changes it.
///
/// Shared as `Arc<SessionManager>` between the API client, the refresh
/// scheduler and the auth context. State changes are published on a
/// [`watch`] channel.
pub struct SessionManager {
	config: ClientConfig,
	dispatcher: Arc<dyn Dispatch>,
	credentials: CredentialStore,
	state: watch::Sender<SessionState>,
	refresh_flight: RefreshFlight,
}

impl SessionManager {
	pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>, dispatcher: Arc<dyn Dispatch>) -> Self {
		let (state, _) = watch::channel(SessionState::Loading);
		Self {
			config,
			dispatcher,
			credentials: CredentialStore::new(store),
			state,
			refresh_flight: Mutex::new(None),
		}
	}

	/// Creates a manager that talks to the configured backend over HTTP.
	pub fn with_http(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
		let dispatcher = HttpDispatcher::new(&config)?;
		Ok(Self::new(config, store, Arc::new(dispatcher)))
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub fn dispatcher(&self) -> &Arc<dyn Dispatch> {
		&self.dispatcher
	}

	/// Latest published state.
	pub fn state(&self) -> SessionState {
		self.state.borrow().clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state.subscribe()
	}

	/// Reads the persisted session and publishes the resulting state.
	///
	/// A session counts as authenticated only when both an access token and a
	/// readable profile are stored.
	pub fn hydrate(&self) -> SessionState {
		let state = self.stored_state();
		debug!(target = "elimu.session", authenticated = state.is_authenticated(), "session hydrated");
		self.state.send_replace(state.clone());
		state
	}

	/// Exchanges username and password for a token pair and profile.
	///
	/// Nothing is stored unless the exchange succeeds. A 400 or 401 answer is
	/// reported as [`Error::InvalidCredentials`].
	pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
		let request = ApiRequest::post(Endpoints::LOGIN).with_json(&LoginRequest {
			username: username.to_string(),
			password: password.to_string(),
		})?;
		let response = self.dispatcher.dispatch(&request, None).await?;
		let status = response.status();

		if status.is_success() {
			let auth: AuthResponse = response.json()?;
			self.credentials.save_session(&CredentialPair::new(&auth.access, &auth.refresh), &auth.user)?;
			self.publish(SessionState::Authenticated(auth.user.clone()));
			info!(target = "elimu.session", user = %auth.user.username, role = %auth.user.role, "logged in");
			return Ok(auth);
		}

		warn!(target = "elimu.session", status = status.as_u16(), "login rejected");
		match status {
			StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(Error::InvalidCredentials(describe_error_body(response.body()))),
			_ => Err(Error::from_response(status.as_u16(), response.body())),
		}
	}

	/// Creates an account.
	///
	/// When the backend issues tokens with the new account the session is
	/// stored exactly as after [`SessionManager::login`]. Otherwise nothing is
	/// stored and the caller is expected to log in.
	pub async fn register(&self, registration: &RegisterRequest) -> Result<RegisterResponse> {
		let request = ApiRequest::post(Endpoints::REGISTER).with_json(registration)?;
		let response = self.dispatcher.dispatch(&request, None).await?;
		let status = response.status();

		if !status.is_success() {
			warn!(target = "elimu.session", status = status.as_u16(), "registration rejected");
			return Err(match status {
				StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::validation(response.body()),
				_ => Error::from_response(status.as_u16(), response.body()),
			});
		}

		let registered: RegisterResponse = response.json()?;
		match &registered.tokens {
			Some(tokens) => {
				self.credentials.save_session(&CredentialPair::from(tokens.clone()), &registered.user)?;
				self.publish(SessionState::Authenticated(registered.user.clone()));
				info!(target = "elimu.session", user = %registered.user.username, "registered and logged in");
			}
			None => info!(target = "elimu.session", user = %registered.user.username, "registered; login required"),
		}
		Ok(registered)
	}

	/// Ends the session.
	///
	/// The backend is asked to revoke the refresh token, refreshing once if the
	/// access token has already expired. The local session is cleared whatever
	/// it answers. Never fails.
	pub async fn logout(&self) {
		if self.credentials.refresh_token().is_some() {
			if let Err(err) = self.revoke().await {
				warn!(target = "elimu.session", error = %err, "server-side logout failed; clearing local session anyway");
			}
		}
		self.clear_session();
		info!(target = "elimu.session", "logged out");
	}

	/// Posts the stored refresh token to the logout endpoint with the same
	/// retry-once rule as [`ApiClient`](crate::ApiClient), minus the login redirect.
	async fn revoke(&self) -> Result<()> {
		let mut bearer = self.credentials.access_token();
		let mut retried = false;
		loop {
			// Re-read on replay: the refresh may have rotated the token.
			let refresh = self.credentials.refresh_token().ok_or(Error::NotAuthenticated)?;
			let request = ApiRequest::post(Endpoints::LOGOUT).with_json(&RefreshRequest { refresh })?;
			let response = self.dispatcher.dispatch(&request, bearer.as_deref()).await?;
			let status = response.status();

			match next_step(status, retried) {
				RetryStep::Return if status.is_success() => return Ok(()),
				RetryStep::Return => return Err(Error::from_response(status.as_u16(), response.body())),
				RetryStep::RefreshAndRetry => {
					retried = true;
					debug!(target = "elimu.session", "logout rejected the access token; refreshing before retry");
					let token = self.refresh_token().await.ok_or_else(|| Error::AuthExpired("token refresh failed during logout".into()))?;
					bearer = Some(token);
				}
			}
		}
	}

	/// Exchanges the stored refresh token for a new access token.
	///
	/// Returns the new access token, or `None` after clearing the session when
	/// the exchange is impossible (no refresh token, rejected, unreachable).
	/// Concurrent callers share one exchange and all receive its outcome.
	pub async fn refresh_token(&self) -> Option<String> {
		loop {
			let waiter = {
				let mut flight = self.refresh_flight.lock();
				match flight.as_mut() {
					Some(waiters) => {
						let (tx, rx) = oneshot::channel();
						waiters.push(tx);
						Some(rx)
					}
					None => {
						*flight = Some(Vec::new());
						None
					}
				}
			};

			let Some(rx) = waiter else {
				let flight = FlightGuard {
					slot: &self.refresh_flight,
					armed: true,
				};
				let outcome = self.exchange_refresh_token().await;
				flight.complete(&outcome);
				return outcome;
			};

			match rx.await {
				Ok(outcome) => return outcome,
				// Leader was cancelled before finishing; take over.
				Err(_) => continue,
			}
		}
	}

	async fn exchange_refresh_token(&self) -> Option<String> {
		match self.try_exchange_refresh_token().await {
			Ok(access) => {
				debug!(target = "elimu.session", "access token refreshed");
				self.publish(self.stored_state());
				Some(access)
			}
			Err(err) => {
				warn!(target = "elimu.session", error = %err, "token refresh failed; clearing session");
				self.clear_session();
				None
			}
		}
	}

	async fn try_exchange_refresh_token(&self) -> Result<String> {
		let refresh = self.credentials.refresh_token().ok_or(Error::NotAuthenticated)?;
		let request = ApiRequest::post(Endpoints::REFRESH).with_json(&RefreshRequest { refresh })?;
		let response = self.dispatcher.dispatch(&request, None).await?;
		if !response.status().is_success() {
			return Err(Error::from_response(response.status().as_u16(), response.body()));
		}

		let tokens: RefreshResponse = response.json()?;
		if tokens.access.is_empty() {
			return Err(Error::AuthExpired("refresh response carried no access token".into()));
		}
		self.credentials.save_tokens(&tokens.access, tokens.refresh.as_deref().filter(|r| !r.is_empty()))?;
		Ok(tokens.access)
	}

	/// Cached profile, or `None` when absent or unreadable.
	pub fn current_user(&self) -> Option<User> {
		self.credentials.user()
	}

	/// True iff an access token is stored. Says nothing about its validity.
	pub fn is_authenticated(&self) -> bool {
		self.credentials.access_token().is_some()
	}

	pub fn access_token(&self) -> Option<String> {
		self.credentials.access_token()
	}

	pub fn stored_refresh_token(&self) -> Option<String> {
		self.credentials.refresh_token()
	}

	pub fn user_role(&self) -> Option<Role> {
		self.current_user().map(|u| u.role)
	}

	pub fn has_role(&self, role: Role) -> bool {
		self.user_role() == Some(role)
	}

	pub fn is_student(&self) -> bool {
		self.has_role(Role::Student)
	}

	pub fn is_instructor(&self) -> bool {
		self.has_role(Role::Instructor)
	}

	pub fn is_partner(&self) -> bool {
		self.has_role(Role::Partner)
	}

	pub fn is_admin(&self) -> bool {
		self.has_role(Role::Admin)
	}

	/// Replaces the cached profile without touching the tokens.
	pub fn update_user_data(&self, user: User) -> Result<()> {
		if self.credentials.credentials().is_none() {
			return Err(Error::NotAuthenticated);
		}
		self.credentials.save_user(&user)?;
		debug!(target = "elimu.session", user = %user.username, "cached profile updated");
		self.publish(SessionState::Authenticated(user));
		Ok(())
	}

	fn stored_state(&self) -> SessionState {
		match (self.credentials.access_token(), self.credentials.user()) {
			(Some(_), Some(user)) => SessionState::Authenticated(user),
			_ => SessionState::Unauthenticated,
		}
	}

	fn clear_session(&self) {
		if let Err(err) = self.credentials.clear() {
			warn!(target = "elimu.store", error = %err, "failed to clear stored session");
		}
		self.publish(SessionState::Unauthenticated);
	}

	fn publish(&self, state: SessionState) {
		self.state.send_replace(state);
	}
}

impl std::fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionManager")
			.field("base_url", &self.config.base_url.as_str())
			.field("state", &*self.state.borrow())
			.finish_non_exhaustive()
	}
}

/// Releases the refresh slot even if the leading task is dropped mid-exchange.
///
/// Dropping the parked senders wakes the waiters with a receive error, and
/// one of them becomes the next leader.
struct FlightGuard<'a> {
	slot: &'a RefreshFlight,
	armed: bool,
}

impl FlightGuard<'_> {
	fn complete(mut self, outcome: &Option<String>) {
		self.armed = false;
		let waiters = self.slot.lock().take().unwrap_or_default();
		for waiter in waiters {
			let _ = waiter.send(outcome.clone());
		}
	}
}

impl Drop for FlightGuard<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.slot.lock().take();
		}
	}
}
