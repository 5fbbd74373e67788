//! User profile as returned by the backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role. Serialized lowercase (`"student"`, `"instructor"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Student,
	Instructor,
	Partner,
	Admin,
}

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Role::Student => "student",
			Role::Instructor => "instructor",
			Role::Partner => "partner",
			Role::Admin => "admin",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"student" => Ok(Role::Student),
			"instructor" => Ok(Role::Instructor),
			"partner" => Ok(Role::Partner),
			"admin" => Ok(Role::Admin),
			other => Err(format!("unknown role '{other}' (expected student, instructor, partner or admin)")),
		}
	}
}

/// Cached user profile.
///
/// Treated as a read-model: the session layer replaces it wholesale and never
/// patches individual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: u64,
	pub username: String,
	pub email: String,
	pub role: Role,
	#[serde(default)]
	pub full_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile_image: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bio: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(default, rename = "is_verified", skip_serializing_if = "Option::is_none")]
	pub verified: Option<bool>,
}
