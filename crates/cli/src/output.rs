use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty-printed JSON
	Json,
}

/// Prints a command result to stdout.
///
/// Text mode shows `text`; JSON mode serializes `data`.
pub fn emit<T: Serialize>(format: OutputFormat, data: &T, text: &str) -> anyhow::Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
		OutputFormat::Text => println!("{text}"),
	}
	Ok(())
}

/// Prints a raw response body: pretty JSON when it parses, verbatim otherwise.
pub fn emit_body(body: &[u8]) {
	match serde_json::from_slice::<Value>(body) {
		Ok(Value::Null) => {}
		Ok(value) => println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())),
		Err(_) => println!("{}", String::from_utf8_lossy(body)),
	}
}

/// One-line summary of a profile for text output.
pub fn describe_user(user: &elimu_protocol::User) -> String {
	let name = if user.full_name.is_empty() { user.username.as_str() } else { user.full_name.as_str() };
	format!("{name} <{}> ({}, id {})", user.email, user.role, user.id)
}
