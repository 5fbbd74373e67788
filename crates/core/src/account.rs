//! Profile and password operations on top of the authenticated client.

use elimu_protocol::{
	ChangePasswordRequest, MessageResponse, PasswordResetRequest, ProfileUpdate, ProfileUpdateResponse, ResetPasswordRequest, User, VerifyEmailRequest,
};
use serde_json::Value;
use tracing::info;

use crate::config::Endpoints;
use crate::error::{Error, Result};
use crate::http::{ApiClient, ApiRequest, ApiResponse};

impl ApiClient {
	/// Fetches the signed-in user's profile and refreshes the cached copy.
	pub async fn fetch_profile(&self) -> Result<User> {
		let user: User = self.get_json(Endpoints::PROFILE).await?;
		self.session().update_user_data(user.clone())?;
		Ok(user)
	}

	/// Applies a partial profile update and caches the returned profile.
	pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileUpdateResponse> {
		if update.is_empty() {
			return Err(Error::Validation {
				message: "No profile changes supplied.".into(),
				fields: Default::default(),
			});
		}
		let request = ApiRequest::patch(Endpoints::UPDATE_PROFILE).with_json(update)?;
		let updated: ProfileUpdateResponse = self.send(request).await.map_err(Error::into_validation)?.json()?;
		self.session().update_user_data(updated.user.clone())?;
		info!(target = "elimu.session", user = %updated.user.username, "profile updated");
		Ok(updated)
	}

	pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<MessageResponse> {
		let request = ApiRequest::post(Endpoints::CHANGE_PASSWORD).with_json(&ChangePasswordRequest {
			old_password: old_password.to_string(),
			new_password: new_password.to_string(),
		})?;
		let response = self.send(request).await.map_err(Error::into_validation)?;
		info!(target = "elimu.session", "password changed");
		message_of(&response)
	}

	/// Starts the password reset flow. Does not require a session.
	pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse> {
		let request = ApiRequest::post(Endpoints::REQUEST_PASSWORD_RESET).with_json(&PasswordResetRequest { email: email.to_string() })?;
		let response = self.send(request).await.map_err(Error::into_validation)?;
		message_of(&response)
	}

	/// Completes the reset flow with the token from the reset email.
	pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<MessageResponse> {
		let request = ApiRequest::post(Endpoints::RESET_PASSWORD).with_json(&ResetPasswordRequest {
			token: token.to_string(),
			new_password: new_password.to_string(),
		})?;
		let response = self.send(request).await.map_err(Error::into_validation)?;
		info!(target = "elimu.session", "password reset completed");
		message_of(&response)
	}

	pub async fn verify_email(&self, token: &str) -> Result<MessageResponse> {
		let request = ApiRequest::post(Endpoints::VERIFY_EMAIL).with_json(&VerifyEmailRequest { token: token.to_string() })?;
		let response = self.send(request).await.map_err(Error::into_validation)?;
		message_of(&response)
	}
}

fn message_of(response: &ApiResponse) -> Result<MessageResponse> {
	match response.json_value()? {
		Value::Null => Ok(MessageResponse::default()),
		value => Ok(serde_json::from_value(value)?),
	}
}
