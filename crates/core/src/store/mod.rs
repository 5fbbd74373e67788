//! Client-local key-value storage for credentials and the cached profile.
//!
//! Each batch call ([`KeyValueStore::set_many`], [`KeyValueStore::remove_many`])
//! is applied as a unit, which is what lets the session layer write and clear
//! the token pair together with the profile.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Synchronous string key-value surface, shared across tasks.
pub trait KeyValueStore: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;

	/// Sets every entry in one atomic step.
	fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;

	/// Removes every key in one atomic step. Missing keys are ignored.
	///
	/// The keys read as absent afterwards even when an error is returned.
	fn remove_many(&self, keys: &[&str]) -> Result<()>;

	fn set(&self, key: &str, value: &str) -> Result<()> {
		self.set_many(&[(key, value)])
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.remove_many(&[key])
	}
}
