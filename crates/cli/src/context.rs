//! Shared state built once per invocation from the global flags.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use elimu::{ApiClient, ClientConfig, FileStore, LoginRedirect, SessionManager};
use tracing::debug;

use crate::cli::Cli;
use crate::output::OutputFormat;

pub const SESSION_FILE: &str = "session.json";

pub struct CliContext {
	pub config: ClientConfig,
	pub session: Arc<SessionManager>,
	pub store_path: PathBuf,
	pub format: OutputFormat,
}

impl CliContext {
	pub fn new(cli: &Cli) -> anyhow::Result<Self> {
		let mut config = ClientConfig::from_env()?;
		if let Some(url) = &cli.api_url {
			config = config.with_base_url(url).with_context(|| format!("invalid --api-url '{url}'"))?;
		}
		if let Some(ms) = cli.timeout_ms {
			config = config.with_timeout(Duration::from_millis(ms));
		}

		let store_path = match &cli.store {
			Some(path) => path.clone(),
			None => default_store_path()?,
		};
		debug!(target = "elimu", store = %store_path.display(), base_url = %config.base_url, "cli context ready");

		let store = Arc::new(FileStore::open(&store_path));
		let session = Arc::new(SessionManager::with_http(config.clone(), store)?);
		Ok(Self {
			config,
			session,
			store_path,
			format: cli.format,
		})
	}

	/// Authenticated client that tells the user to log in again when the session dies.
	pub fn client(&self) -> ApiClient {
		ApiClient::new(self.session.clone()).with_login_redirect(Arc::new(PromptLogin))
	}
}

fn default_store_path() -> anyhow::Result<PathBuf> {
	let dir = dirs::config_dir().ok_or_else(|| anyhow!("no config directory on this platform; pass --store"))?;
	Ok(dir.join("elimu").join(SESSION_FILE))
}

/// Terminal stand-in for navigating to the login page.
struct PromptLogin;

impl LoginRedirect for PromptLogin {
	fn redirect_to_login(&self, login_url: &str) {
		eprintln!("Your session has expired. Run `elimu login <username>` to sign in again ({login_url}).");
	}
}
