use std::path::PathBuf;

use clap::{Parser, Subcommand};
use elimu_protocol::Role;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "elimu")]
#[command(about = "Elimu Space API client with a persistent login session")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Session file (defaults to <config dir>/elimu/session.json)
	#[arg(long, global = true, value_name = "FILE", env = "ELIMU_SESSION_FILE")]
	pub store: Option<PathBuf>,

	/// API base URL, overriding ELIMU_API_BASE_URL
	#[arg(long, global = true, value_name = "URL")]
	pub api_url: Option<String>,

	/// Request timeout in milliseconds, overriding ELIMU_API_TIMEOUT
	#[arg(long, global = true, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Sign in and store the session
	Login {
		username: String,
		/// Password (read from stdin when omitted)
		#[arg(long, env = "ELIMU_PASSWORD", hide_env_values = true)]
		password: Option<String>,
	},

	/// Create an account
	Register {
		username: String,
		email: String,
		/// student, instructor, partner or admin
		#[arg(long, default_value = "student")]
		role: Role,
		/// Password (read from stdin when omitted)
		#[arg(long, env = "ELIMU_PASSWORD", hide_env_values = true)]
		password: Option<String>,
		#[arg(long)]
		first_name: Option<String>,
		#[arg(long)]
		last_name: Option<String>,
		#[arg(long)]
		country: Option<String>,
	},

	/// Sign out and forget the stored session
	Logout,

	/// Show the cached user profile
	Whoami,

	/// Show whether a session is stored and what it allows
	Status,

	/// Exchange the refresh token for a new access token now
	Refresh,

	/// Send an authenticated request and print the response body
	#[command(alias = "req")]
	Request {
		/// HTTP method (GET, POST, PUT, PATCH, DELETE)
		method: String,
		/// Path relative to the API base, e.g. courses/
		path: String,
		/// JSON request body
		#[arg(short, long)]
		data: Option<String>,
	},

	/// View or edit the signed-in user's profile
	#[command(subcommand)]
	Profile(ProfileCommand),

	/// Change or reset the account password
	#[command(subcommand)]
	Password(PasswordCommand),

	/// Confirm the account email address with the emailed token
	VerifyEmail { token: String },

	/// Keep the session fresh in the foreground until interrupted
	Keepalive,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
	/// Fetch the profile from the server and update the cache
	Show,
	/// Update profile fields
	Update {
		#[arg(long)]
		first_name: Option<String>,
		#[arg(long)]
		last_name: Option<String>,
		#[arg(long)]
		bio: Option<String>,
		#[arg(long)]
		country: Option<String>,
		#[arg(long, value_name = "URL")]
		profile_image: Option<String>,
	},
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
	/// Change the password of the signed-in account
	Change {
		#[arg(long)]
		old: String,
		#[arg(long)]
		new: String,
	},
	/// Email a password reset link
	Reset { email: String },
	/// Set a new password using the token from the reset email
	Confirm {
		#[arg(long)]
		token: String,
		#[arg(long)]
		new: String,
	},
}
