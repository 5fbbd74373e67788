use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::request::{ApiRequest, ApiResponse};
use super::retry::{RetryStep, next_step};
use crate::error::{Error, Result};
use crate::session::SessionManager;

/// Hook invoked when a session cannot be recovered and the user has to sign in again.
pub trait LoginRedirect: Send + Sync {
	fn redirect_to_login(&self, login_url: &str);
}

impl<F> LoginRedirect for F
where
	F: Fn(&str) + Send + Sync,
{
	fn redirect_to_login(&self, login_url: &str) {
		self(login_url)
	}
}

/// Default hook: records the redirect in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLoginRedirect;

impl LoginRedirect for TracingLoginRedirect {
	fn redirect_to_login(&self, login_url: &str) {
		warn!(target = "elimu.http", %login_url, "session expired; sign in again");
	}
}

/// Authenticated API client.
///
/// Every request carries the stored access token. A first 401 triggers one
/// session refresh and one replay with the new token; a failed refresh fires
/// the [`LoginRedirect`] hook and yields [`Error::AuthExpired`].
#[derive(Clone)]
pub struct ApiClient {
	session: Arc<SessionManager>,
	redirect: Arc<dyn LoginRedirect>,
}

impl ApiClient {
	pub fn new(session: Arc<SessionManager>) -> Self {
		Self {
			session,
			redirect: Arc::new(TracingLoginRedirect),
		}
	}

	pub fn with_login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
		self.redirect = redirect;
		self
	}

	pub fn session(&self) -> &Arc<SessionManager> {
		&self.session
	}

	/// Sends `request` through the refresh-and-retry-once pipeline.
	///
	/// Returns the response for 2xx and 3xx answers. Any other final status
	/// becomes an [`Error`] carrying the backend's message.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		let dispatcher = self.session.dispatcher();
		let mut bearer = self.session.access_token();
		let mut retried = false;

		loop {
			let response = dispatcher.dispatch(&request, bearer.as_deref()).await?;
			match next_step(response.status(), retried) {
				RetryStep::Return => return into_result(response),
				RetryStep::RefreshAndRetry => {
					retried = true;
					debug!(target = "elimu.http", method = %request.method, path = %request.path, "unauthorized; refreshing session");
					match self.fresh_token(bearer.as_deref()).await {
						Some(token) => bearer = Some(token),
						None => {
							self.redirect.redirect_to_login(&self.session.config().login_url());
							return Err(Error::AuthExpired("token refresh failed".into()));
						}
					}
				}
			}
		}
	}

	/// New access token for a replay.
	///
	/// If another request already rotated the token since `stale` was read,
	/// that token is reused instead of spending the refresh token again.
	async fn fresh_token(&self, stale: Option<&str>) -> Option<String> {
		match self.session.access_token() {
			Some(current) if stale.is_some_and(|s| s != current) => Some(current),
			_ => self.session.refresh_token().await,
		}
	}

	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::get(path)).await
	}

	pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
		self.send(ApiRequest::post(path).with_json(body)?).await
	}

	pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
		self.send(ApiRequest::put(path).with_json(body)?).await
	}

	pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
		self.send(ApiRequest::patch(path).with_json(body)?).await
	}

	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::delete(path)).await
	}

	pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
		self.send_json(ApiRequest::get(path)).await
	}

	pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
		self.send(request).await?.json()
	}
}

impl std::fmt::Debug for ApiClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ApiClient").field("session", &self.session).finish_non_exhaustive()
	}
}

fn into_result(response: ApiResponse) -> Result<ApiResponse> {
	let status = response.status();
	if status.is_success() || status.is_redirection() {
		Ok(response)
	} else {
		Err(Error::from_response(status.as_u16(), response.body()))
	}
}
