//! Request and response bodies for the `users/*` account endpoints.

use serde::{Deserialize, Serialize};

use crate::user::User;

/// Partial profile update sent to `PATCH users/profile/update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bio: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile_image: Option<String>,
}

impl ProfileUpdate {
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}
}

/// Response of `PATCH users/profile/update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
	#[serde(default)]
	pub message: Option<String>,
	pub user: User,
}

/// Body of `POST users/change-password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
	pub old_password: String,
	pub new_password: String,
}

/// Body of `POST auth/request-password-reset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
	pub email: String,
}

/// Body of `POST auth/reset-password`: the emailed token plus the new password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
	pub token: String,
	pub new_password: String,
}

/// Body of `POST auth/verify-email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
	pub token: String,
}
