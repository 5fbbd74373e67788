//! Error types for the session client.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Fallback message when an error body carries nothing readable.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Message prefix for failures where no response reached the caller.
pub const NO_RESPONSE_MESSAGE: &str = "No response from server. Please check your connection.";

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the session manager, the HTTP pipeline and the stores.
#[derive(Debug, Error)]
pub enum Error {
	/// No response reached the server or came back (timeout, refused connection, DNS).
	#[error("No response from server. Please check your connection. ({0})")]
	Network(String),

	/// Structured field-level rejection from the server.
	#[error("{message}")]
	Validation { message: String, fields: BTreeMap<String, Vec<String>> },

	/// Login rejected by the server.
	#[error("{0}")]
	InvalidCredentials(String),

	/// Token refresh failed; the stored session has been cleared.
	#[error("session expired: {0}")]
	AuthExpired(String),

	/// Any status the pipeline does not handle itself, passed through to the caller.
	#[error("HTTP {status}: {message}")]
	Http { status: u16, message: String, body: Option<Value> },

	/// Operation requires a stored session.
	#[error("not signed in")]
	NotAuthenticated,

	#[error("storage error: {0}")]
	Storage(String),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Url(#[from] url::ParseError),
}

impl Error {
	/// HTTP status carried by the error, if the server answered.
	pub fn status(&self) -> Option<u16> {
		match self {
			Error::Http { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns true when the failure happened before any response arrived.
	pub fn is_network(&self) -> bool {
		matches!(self, Error::Network(_))
	}

	/// Builds a passthrough error from a raw response body.
	pub fn from_response(status: u16, body: &[u8]) -> Self {
		Error::Http {
			status,
			message: describe_error_body(body),
			body: serde_json::from_slice(body).ok(),
		}
	}

	/// Reclassifies a 400 passthrough as a validation error.
	pub fn into_validation(self) -> Self {
		match self {
			Error::Http { status: 400, message, body } => Error::Validation {
				fields: body.as_ref().map(field_errors).unwrap_or_default(),
				message,
			},
			other => other,
		}
	}

	/// Builds a validation error, collecting per-field messages from the body.
	pub fn validation(body: &[u8]) -> Self {
		let fields = serde_json::from_slice::<Value>(body).map(|v| field_errors(&v)).unwrap_or_default();
		Error::Validation {
			message: describe_error_body(body),
			fields,
		}
	}
}

/// Reduces a server error body to one human-readable message.
///
/// Priority: plain string body, `detail`, `message`, first validation entry,
/// then [`GENERIC_ERROR_MESSAGE`].
pub fn describe_error_body(body: &[u8]) -> String {
	let value = match serde_json::from_slice::<Value>(body) {
		Ok(value) => value,
		Err(_) => {
			let text = String::from_utf8_lossy(body);
			let text = text.trim();
			return if text.is_empty() { GENERIC_ERROR_MESSAGE.to_string() } else { text.to_string() };
		}
	};
	describe_error_value(&value)
}

/// Same as [`describe_error_body`] for an already parsed JSON value.
pub fn describe_error_value(value: &Value) -> String {
	match value {
		Value::String(s) if !s.is_empty() => return s.clone(),
		Value::Object(map) => {
			for key in ["detail", "message"] {
				if let Some(Value::String(s)) = map.get(key) {
					if !s.is_empty() {
						return s.clone();
					}
				}
			}
			if let Some((_, first)) = map.iter().next() {
				match first {
					Value::Array(items) => {
						if let Some(Value::String(s)) = items.first() {
							return s.clone();
						}
					}
					Value::String(s) if !s.is_empty() => return s.clone(),
					_ => {}
				}
			}
		}
		_ => {}
	}
	GENERIC_ERROR_MESSAGE.to_string()
}

/// Collects `{"field": ["msg", ...]}` and `{"field": "msg"}` entries.
pub fn field_errors(value: &Value) -> BTreeMap<String, Vec<String>> {
	let Value::Object(map) = value else {
		return BTreeMap::new();
	};
	map.iter()
		.filter_map(|(field, v)| {
			let messages: Vec<String> = match v {
				Value::Array(items) => items.iter().filter_map(|i| i.as_str().map(String::from)).collect(),
				Value::String(s) => vec![s.clone()],
				_ => return None,
			};
			(!messages.is_empty()).then(|| (field.clone(), messages))
		})
		.collect()
}
