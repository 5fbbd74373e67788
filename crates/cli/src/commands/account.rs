use elimu_protocol::ProfileUpdate;

use crate::cli::{PasswordCommand, ProfileCommand};
use crate::context::CliContext;
use crate::output::{describe_user, emit};

pub async fn profile(ctx: &CliContext, command: ProfileCommand) -> anyhow::Result<()> {
	let client = ctx.client();
	match command {
		ProfileCommand::Show => {
			let user = client.fetch_profile().await?;
			emit(ctx.format, &user, &describe_user(&user))
		}
		ProfileCommand::Update {
			first_name,
			last_name,
			bio,
			country,
			profile_image,
		} => {
			let update = ProfileUpdate {
				first_name,
				last_name,
				bio,
				country,
				profile_image,
			};
			let updated = client.update_profile(&update).await?;
			let message = updated.message.as_deref().unwrap_or("Profile updated");
			emit(ctx.format, &updated, &format!("{message}\n{}", describe_user(&updated.user)))
		}
	}
}

pub async fn password(ctx: &CliContext, command: PasswordCommand) -> anyhow::Result<()> {
	let client = ctx.client();
	let response = match command {
		PasswordCommand::Change { old, new } => client.change_password(&old, &new).await?,
		PasswordCommand::Reset { email } => client.request_password_reset(&email).await?,
		PasswordCommand::Confirm { token, new } => client.reset_password(&token, &new).await?,
	};
	let text = response.message.clone().unwrap_or_else(|| "Done".to_string());
	emit(ctx.format, &response, &text)
}

pub async fn verify_email(ctx: &CliContext, token: &str) -> anyhow::Result<()> {
	let response = ctx.client().verify_email(token).await?;
	let text = response.message.clone().unwrap_or_else(|| "Email verified".to_string());
	emit(ctx.format, &response, &text)
}
