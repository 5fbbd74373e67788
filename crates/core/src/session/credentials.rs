//! Typed view of the credential keys inside a [`KeyValueStore`].

use std::sync::Arc;

use elimu_protocol::{TokenPair, User};
use tracing::debug;

use crate::error::Result;
use crate::store::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// JSON-serialized [`User`].
pub const USER_KEY: &str = "user";

const ALL_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// Access and refresh token held together.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
	pub access_token: String,
	pub refresh_token: String,
}

impl std::fmt::Debug for CredentialPair {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

impl CredentialPair {
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: access_token.into(),
			refresh_token: refresh_token.into(),
		}
	}
}

impl From<TokenPair> for CredentialPair {
	fn from(tokens: TokenPair) -> Self {
		Self::new(tokens.access, tokens.refresh)
	}
}

/// Reads and writes the session keys as a unit.
///
/// Writes that touch more than one key go through a single batch call, so a
/// reader never sees a token without its partner.
#[derive(Clone)]
pub struct CredentialStore {
	backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
	pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
		Self { backend }
	}

	pub fn access_token(&self) -> Option<String> {
		self.non_empty(ACCESS_TOKEN_KEY)
	}

	pub fn refresh_token(&self) -> Option<String> {
		self.non_empty(REFRESH_TOKEN_KEY)
	}

	pub fn credentials(&self) -> Option<CredentialPair> {
		Some(CredentialPair::new(self.access_token()?, self.refresh_token()?))
	}

	/// Cached profile. Unparseable data reads as absent.
	pub fn user(&self) -> Option<User> {
		let raw = self.backend.get(USER_KEY)?;
		match serde_json::from_str(&raw) {
			Ok(user) => Some(user),
			Err(e) => {
				debug!(target = "elimu.store", error = %e, "ignoring unparseable cached profile");
				None
			}
		}
	}

	pub fn save_session(&self, credentials: &CredentialPair, user: &User) -> Result<()> {
		let user = serde_json::to_string(user)?;
		self.backend.set_many(&[
			(ACCESS_TOKEN_KEY, credentials.access_token.as_str()),
			(REFRESH_TOKEN_KEY, credentials.refresh_token.as_str()),
			(USER_KEY, user.as_str()),
		])
	}

	/// Replaces the access token, and the refresh token when one was issued.
	pub fn save_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
		match refresh_token {
			Some(refresh) => self.backend.set_many(&[(ACCESS_TOKEN_KEY, access_token), (REFRESH_TOKEN_KEY, refresh)]),
			None => self.backend.set(ACCESS_TOKEN_KEY, access_token),
		}
	}

	pub fn save_user(&self, user: &User) -> Result<()> {
		let user = serde_json::to_string(user)?;
		self.backend.set(USER_KEY, &user)
	}

	pub fn clear(&self) -> Result<()> {
		self.backend.remove_many(&ALL_KEYS)
	}

	fn non_empty(&self, key: &str) -> Option<String> {
		self.backend.get(key).filter(|v| !v.is_empty())
	}
}
