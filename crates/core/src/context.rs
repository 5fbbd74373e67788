//! Application-facing auth context: session state plus the proactive refresh timer.

use std::sync::Arc;
use std::time::Duration;

use elimu_protocol::{RegisterRequest, RegisterResponse, User};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Result;
use crate::refresh::{RefreshHandle, RefreshScheduler};
use crate::session::{SessionManager, SessionState};

/// Keeps a [`SessionManager`] and a refresh timer in step.
///
/// The timer runs exactly while a session is believed to exist: it starts on
/// mount (if a session was cached), login and token-issuing registration, and
/// stops on logout or unmount. Must be used inside a tokio runtime.
pub struct AuthContext {
	session: Arc<SessionManager>,
	interval: Duration,
	refresh: Mutex<Option<RefreshHandle>>,
}

impl AuthContext {
	/// Hydrates from the store without any network call and starts the timer
	/// if a session was found.
	pub fn mount(session: Arc<SessionManager>, interval: Duration) -> Self {
		let context = Self {
			session,
			interval,
			refresh: Mutex::new(None),
		};
		let state = context.session.hydrate();
		if state.is_authenticated() {
			context.start_refresh();
		}
		info!(target = "elimu.session", authenticated = state.is_authenticated(), "auth context mounted");
		context
	}

	pub fn session(&self) -> &Arc<SessionManager> {
		&self.session
	}

	pub async fn login(&self, username: &str, password: &str) -> Result<User> {
		let auth = self.session.login(username, password).await?;
		self.start_refresh();
		Ok(auth.user)
	}

	pub async fn register(&self, registration: &RegisterRequest) -> Result<RegisterResponse> {
		let registered = self.session.register(registration).await?;
		if registered.tokens.is_some() {
			self.start_refresh();
		}
		Ok(registered)
	}

	pub async fn logout(&self) {
		self.stop_refresh().await;
		self.session.logout().await;
	}

	pub fn update_user(&self, user: User) -> Result<()> {
		self.session.update_user_data(user)
	}

	pub fn state(&self) -> SessionState {
		self.session.state()
	}

	pub fn user(&self) -> Option<User> {
		self.state().user().cloned()
	}

	/// Reflects published state, so it may be optimistic until the first API call.
	pub fn is_authenticated(&self) -> bool {
		self.state().is_authenticated()
	}

	pub fn is_loading(&self) -> bool {
		self.state().is_loading()
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.session.subscribe()
	}

	/// True while the proactive refresh timer is alive.
	pub fn is_refreshing(&self) -> bool {
		self.refresh.lock().as_ref().is_some_and(|h| !h.is_finished())
	}

	/// Stops the timer. The stored session is left as is.
	pub async fn unmount(self) {
		self.stop_refresh().await;
		debug!(target = "elimu.session", "auth context unmounted");
	}

	fn start_refresh(&self) {
		let handle = RefreshScheduler::spawn(self.session.clone(), self.interval);
		// Replacing an older handle drops it, which aborts its task.
		self.refresh.lock().replace(handle);
	}

	async fn stop_refresh(&self) {
		let handle = self.refresh.lock().take();
		if let Some(handle) = handle {
			handle.cancel().await;
		}
	}
}

impl std::fmt::Debug for AuthContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthContext")
			.field("state", &self.state())
			.field("interval", &self.interval)
			.finish_non_exhaustive()
	}
}
