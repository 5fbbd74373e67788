//! Fixtures shared by the unit tests.

use std::sync::Arc;

use elimu_protocol::{Role, User};

use crate::session::{CredentialPair, CredentialStore};
use crate::store::MemoryStore;

pub fn sample_user() -> User {
	User {
		id: 7,
		username: "amina".into(),
		email: "amina@example.com".into(),
		role: Role::Student,
		full_name: "Amina Njeri".into(),
		first_name: Some("Amina".into()),
		last_name: Some("Njeri".into()),
		profile_image: None,
		bio: None,
		country: Some("Kenya".into()),
		verified: Some(true),
	}
}

pub fn sample_user_json() -> serde_json::Value {
	serde_json::to_value(sample_user()).unwrap()
}

/// Memory store already holding `access`/`refresh` and [`sample_user`].
pub fn signed_in_store(access: &str, refresh: &str) -> Arc<MemoryStore> {
	let store = Arc::new(MemoryStore::new());
	CredentialStore::new(store.clone())
		.save_session(&CredentialPair::new(access, refresh), &sample_user())
		.unwrap();
	store
}
