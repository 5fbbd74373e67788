use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use reqwest::{Method, StatusCode};

use crate::error::Result;

/// Replayable description of one API call.
///
/// Holds everything needed to send the same request twice, which the
/// refresh-and-retry path relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
	pub method: Method,
	/// Path relative to the configured API base.
	pub path: String,
	pub query: Vec<(String, String)>,
	pub body: Option<Value>,
}

impl ApiRequest {
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			body: None,
		}
	}

	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Sets a JSON body from any serializable value.
	pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
		self.body = Some(serde_json::to_value(body)?);
		Ok(self)
	}

	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);
		self
	}

	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));
		self
	}
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
	status: StatusCode,
	body: Vec<u8>,
}

impl ApiResponse {
	pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
		Self { status, body }
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}

	pub fn body(&self) -> &[u8] {
		&self.body
	}

	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
		Ok(serde_json::from_slice(&self.body)?)
	}

	/// Parses the body as JSON, treating an empty body as `null`.
	pub fn json_value(&self) -> Result<Value> {
		if self.body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Value::Null);
		}
		self.json()
	}
}
