//! Session lifecycle commands: login, register, logout, whoami, status, refresh.

use anyhow::bail;
use elimu_protocol::{RegisterRequest, Role};
use serde_json::json;

use super::resolve_password;
use crate::context::CliContext;
use crate::output::{describe_user, emit};

pub struct Registration {
	pub username: String,
	pub email: String,
	pub role: Role,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub country: Option<String>,
}

pub async fn login(ctx: &CliContext, username: &str, password: Option<String>) -> anyhow::Result<()> {
	let password = resolve_password(password)?;
	let auth = ctx.session.login(username, &password).await?;
	emit(ctx.format, &auth.user, &format!("Logged in as {}", describe_user(&auth.user)))
}

pub async fn register(ctx: &CliContext, registration: Registration, password: Option<String>) -> anyhow::Result<()> {
	let password = resolve_password(password)?;
	let request = RegisterRequest {
		username: registration.username,
		email: registration.email,
		password: password.clone(),
		password2: password,
		role: registration.role,
		first_name: registration.first_name,
		last_name: registration.last_name,
		country: registration.country,
	};
	let registered = ctx.session.register(&request).await?;

	let mut text = format!("Registered {}", describe_user(&registered.user));
	if let Some(message) = &registered.message {
		text = format!("{text}\n{message}");
	}
	if registered.tokens.is_none() {
		text.push_str("\nRun `elimu login` to sign in.");
	}
	emit(ctx.format, &registered.user, &text)
}

pub async fn logout(ctx: &CliContext) -> anyhow::Result<()> {
	ctx.session.logout().await;
	emit(ctx.format, &json!({ "authenticated": false }), "Logged out")
}

pub fn whoami(ctx: &CliContext) -> anyhow::Result<()> {
	let Some(user) = ctx.session.current_user() else {
		bail!("not signed in");
	};
	emit(ctx.format, &user, &describe_user(&user))
}

pub fn status(ctx: &CliContext) -> anyhow::Result<()> {
	let session = &ctx.session;
	let user = session.current_user();
	let data = json!({
		"authenticated": session.is_authenticated(),
		"user": user.as_ref().map(|u| &u.username),
		"role": session.user_role(),
		"is_student": session.is_student(),
		"is_instructor": session.is_instructor(),
		"is_partner": session.is_partner(),
		"is_admin": session.is_admin(),
		"store": ctx.store_path,
		"api": ctx.config.base_url.as_str(),
	});
	let text = match (&user, session.is_authenticated()) {
		(Some(user), true) => format!("Signed in as {}\nStore: {}", describe_user(user), ctx.store_path.display()),
		(None, true) => format!("Tokens stored but no readable profile\nStore: {}", ctx.store_path.display()),
		_ => format!("Not signed in\nStore: {}", ctx.store_path.display()),
	};
	emit(ctx.format, &data, &text)
}

pub async fn refresh(ctx: &CliContext) -> anyhow::Result<()> {
	if ctx.session.stored_refresh_token().is_none() {
		bail!("not signed in");
	}
	if ctx.session.refresh_token().await.is_none() {
		bail!("token refresh failed; the session has been cleared, sign in again");
	}
	emit(ctx.format, &json!({ "refreshed": true }), "Access token refreshed")
}
