//! Request and response bodies for the `auth/*` endpoints.

use serde::{Deserialize, Serialize};

use crate::user::{Role, User};

/// Body of `POST auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub username: String,
	pub password: String,
}

/// Response of `POST auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
	pub access: String,
	pub refresh: String,
	pub user: User,
}

/// Body of `POST auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
	pub username: String,
	pub email: String,
	pub password: String,
	/// Confirmation; the backend rejects the request when it differs from `password`.
	pub password2: String,
	pub role: Role,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
}

/// Access/refresh pair as nested in the registration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	pub access: String,
	pub refresh: String,
}

/// Response of `POST auth/register`.
///
/// `tokens` is absent when the backend defers sign-in (e.g. pending email
/// verification); nothing is persisted in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
	pub user: User,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub tokens: Option<TokenPair>,
}

/// Body of `POST auth/refresh` and `POST auth/logout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
	pub refresh: String,
}

/// Response of `POST auth/refresh`. A missing `refresh` means no rotation occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
	pub access: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh: Option<String>,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
	#[serde(default)]
	pub message: Option<String>,
}
