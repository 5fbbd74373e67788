use std::collections::HashMap;

use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::Result;

/// Process-lifetime store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored keys.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).cloned()
	}

	fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
		let mut map = self.entries.lock();
		for (key, value) in entries {
			map.insert((*key).to_string(), (*value).to_string());
		}
		Ok(())
	}

	fn remove_many(&self, keys: &[&str]) -> Result<()> {
		let mut map = self.entries.lock();
		for key in keys {
			map.remove(*key);
		}
		Ok(())
	}
}
