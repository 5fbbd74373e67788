//! Authenticated session: credential persistence, login lifecycle, token refresh.

mod credentials;
mod manager;
mod state;

pub use credentials::{ACCESS_TOKEN_KEY, CredentialPair, CredentialStore, REFRESH_TOKEN_KEY, USER_KEY};
pub use manager::SessionManager;
pub use state::SessionState;

#[cfg(test)]
mod tests;
