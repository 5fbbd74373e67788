//! Authenticated API session management for the Elimu Space backend.
//!
//! The crate keeps a token-based session alive on behalf of a client:
//!
//! * [`SessionManager`] logs in, registers, logs out and refreshes tokens,
//!   persisting the credential pair and profile in a [`KeyValueStore`].
//! * [`ApiClient`] sends requests with the stored bearer token and recovers
//!   from an expired access token by refreshing once and replaying the call.
//! * [`RefreshScheduler`] renews the access token proactively on a timer.
//! * [`AuthContext`] ties the session and the timer to an observable
//!   [`SessionState`] for UI-style consumers.
//!
//! ```ignore
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileStore::open("session.json"));
//! let session = Arc::new(SessionManager::with_http(config.clone(), store)?);
//! let context = AuthContext::mount(session.clone(), config.refresh_interval);
//! context.login("amina", "secret").await?;
//! let courses: serde_json::Value = ApiClient::new(session).get_json("courses").await?;
//! ```

mod account;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod refresh;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::{ClientConfig, Endpoints};
pub use context::AuthContext;
pub use elimu_protocol as protocol;
pub use error::{Error, Result};
pub use http::{ApiClient, ApiRequest, ApiResponse, Dispatch, HttpDispatcher, LoginRedirect, TracingLoginRedirect};
pub use refresh::{RefreshHandle, RefreshScheduler};
pub use session::{SessionManager, SessionState};
pub use store::{FileStore, KeyValueStore, MemoryStore};
