use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{Error, Result};

/// JSON-file store that survives restarts.
///
/// The whole map is rewritten on every batch through a sibling temp file and a
/// rename, so a crash never leaves half a batch on disk. A missing or corrupt
/// file loads as an empty store.
#[derive(Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
	pub fn open(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let entries = match fs::read_to_string(&path) {
			Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
				warn!(target = "elimu.store", path = %path.display(), error = %err, "store file is corrupt; starting empty");
				HashMap::new()
			}),
			Err(err) => {
				debug!(target = "elimu.store", path = %path.display(), error = %err, "no store file; starting empty");
				HashMap::new()
			}
		};
		Self {
			path,
			entries: Mutex::new(entries),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		let json = serde_json::to_string_pretty(entries)?;
		let tmp = self.path.with_extension("json.tmp");
		fs::write(&tmp, json)?;
		fs::rename(&tmp, &self.path).map_err(|err| Error::Storage(format!("failed to replace {}: {err}", self.path.display())))
	}
}

impl KeyValueStore for FileStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).cloned()
	}

	fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
		let mut map = self.entries.lock();
		let mut next = map.clone();
		for (key, value) in entries {
			next.insert((*key).to_string(), (*value).to_string());
		}
		self.persist(&next)?;
		*map = next;
		Ok(())
	}

	fn remove_many(&self, keys: &[&str]) -> Result<()> {
		let mut map = self.entries.lock();
		if !keys.iter().any(|k| map.contains_key(*k)) {
			return Ok(());
		}
		// Readers must never see removed keys again, even if the write below fails.
		for key in keys {
			map.remove(*key);
		}
		self.persist(&map)
	}
}
