//! Subcommand implementations.

mod account;
mod auth;
mod keepalive;
mod request;

use std::io::BufRead;

use anyhow::{Context, bail};

use crate::cli::Commands;
use crate::context::CliContext;

pub async fn dispatch(command: Commands, ctx: &CliContext) -> anyhow::Result<()> {
	match command {
		Commands::Login { username, password } => auth::login(ctx, &username, password).await,
		Commands::Register {
			username,
			email,
			role,
			password,
			first_name,
			last_name,
			country,
		} => {
			let registration = auth::Registration {
				username,
				email,
				role,
				first_name,
				last_name,
				country,
			};
			auth::register(ctx, registration, password).await
		}
		Commands::Logout => auth::logout(ctx).await,
		Commands::Whoami => auth::whoami(ctx),
		Commands::Status => auth::status(ctx),
		Commands::Refresh => auth::refresh(ctx).await,
		Commands::Request { method, path, data } => request::run(ctx, &method, &path, data.as_deref()).await,
		Commands::Profile(command) => account::profile(ctx, command).await,
		Commands::Password(command) => account::password(ctx, command).await,
		Commands::VerifyEmail { token } => account::verify_email(ctx, &token).await,
		Commands::Keepalive => keepalive::run(ctx).await,
	}
}

/// Uses the flag value, or reads one line from stdin.
fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
	if let Some(password) = password {
		return Ok(password);
	}
	let mut line = String::new();
	std::io::stdin().lock().read_line(&mut line).context("failed to read password from stdin")?;
	let password = line.trim_end_matches(['\r', '\n']).to_string();
	if password.is_empty() {
		bail!("a password is required (pass --password or pipe it on stdin)");
	}
	Ok(password)
}
