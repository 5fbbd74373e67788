//! Client configuration: API base endpoint, request timeout, refresh cadence.
//!
//! Values are deployment-time settings. Every backend endpoint is derived by
//! path-joining onto [`ClientConfig::base_url`].

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Shorter than the ~60 minute access-token lifetime so renewal usually wins the race.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);
pub const DEFAULT_LOGIN_PATH: &str = "/login";

pub const ENV_BASE_URL: &str = "ELIMU_API_BASE_URL";
/// Milliseconds.
pub const ENV_TIMEOUT: &str = "ELIMU_API_TIMEOUT";
pub const ENV_REFRESH_INTERVAL: &str = "ELIMU_REFRESH_INTERVAL_SECS";

/// Settings shared by the dispatcher, the session manager and the scheduler.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// API root. Always ends with `/` so relative joins append instead of replacing.
	pub base_url: Url,
	pub timeout: Duration,
	pub refresh_interval: Duration,
	/// Login entry point handed to the redirect hook when a session cannot be recovered.
	pub login_path: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
			timeout: DEFAULT_TIMEOUT,
			refresh_interval: DEFAULT_REFRESH_INTERVAL,
			login_path: DEFAULT_LOGIN_PATH.to_string(),
		}
	}
}

impl ClientConfig {
	/// Creates a config for `base_url` with default timeout and refresh interval.
	pub fn new(base_url: &str) -> Result<Self> {
		Ok(Self {
			base_url: normalize_base(base_url)?,
			..Default::default()
		})
	}

	/// Reads overrides from the process environment.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads overrides through `lookup`; unset or empty values keep defaults.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		let mut config = Self::default();

		if let Some(base) = get(ENV_BASE_URL) {
			config.base_url = normalize_base(&base)?;
		}
		if let Some(ms) = get(ENV_TIMEOUT) {
			let ms: u64 = ms.parse().map_err(|_| Error::Config(format!("{ENV_TIMEOUT} must be a number of milliseconds, got '{ms}'")))?;
			config.timeout = Duration::from_millis(ms);
		}
		if let Some(secs) = get(ENV_REFRESH_INTERVAL) {
			let secs: u64 = secs
				.parse()
				.map_err(|_| Error::Config(format!("{ENV_REFRESH_INTERVAL} must be a number of seconds, got '{secs}'")))?;
			config.refresh_interval = Duration::from_secs(secs);
		}
		config.validate()?;
		Ok(config)
	}

	pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
		self.base_url = normalize_base(base_url)?;
		Ok(self)
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
		self.refresh_interval = interval;
		self
	}

	pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();
		self
	}

	/// Rejects zero durations, which would disable the timeout or spin the scheduler.
	pub fn validate(&self) -> Result<()> {
		if self.timeout.is_zero() {
			return Err(Error::Config("request timeout must be greater than zero".into()));
		}
		if self.refresh_interval.is_zero() {
			return Err(Error::Config("refresh interval must be greater than zero".into()));
		}
		Ok(())
	}

	/// Resolves a path relative to the API root.
	pub fn endpoint(&self, path: &str) -> Result<Url> {
		Ok(self.base_url.join(path.trim_start_matches('/'))?)
	}

	/// Absolute login entry point on the API host.
	pub fn login_url(&self) -> String {
		self.base_url
			.join(&self.login_path)
			.map(|u| u.to_string())
			.unwrap_or_else(|_| self.login_path.clone())
	}
}

/// Relative paths of the auth and account endpoints.
pub struct Endpoints;

impl Endpoints {
	pub const REGISTER: &'static str = "auth/register";
	pub const LOGIN: &'static str = "auth/login";
	pub const LOGOUT: &'static str = "auth/logout";
	pub const REFRESH: &'static str = "auth/refresh";
	pub const VERIFY_EMAIL: &'static str = "auth/verify-email";
	pub const REQUEST_PASSWORD_RESET: &'static str = "auth/request-password-reset";
	pub const RESET_PASSWORD: &'static str = "auth/reset-password";
	pub const PROFILE: &'static str = "users/profile";
	pub const UPDATE_PROFILE: &'static str = "users/profile/update";
	pub const CHANGE_PASSWORD: &'static str = "users/change-password";
}

fn normalize_base(raw: &str) -> Result<Url> {
	let mut url = Url::parse(raw.trim())?;
	if url.cannot_be_a_base() {
		return Err(Error::Config(format!("'{raw}' cannot be used as an API base url")));
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());
		url.set_path(&path);
	}
	Ok(url)
}
