//! In-memory [`Dispatch`] used to script backend behavior in tests.
//!
//! Replies are looked up per request path: queued one-shot replies first, then
//! a route handler, then a 404. Every request is recorded with the bearer it
//! carried so tests can assert on what actually went over the "wire".

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::dispatch::Dispatch;
use super::request::{ApiRequest, ApiResponse, Method, StatusCode};
use crate::error::{Error, Result};

/// A scripted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeReply {
	Respond { status: u16, body: Value, delay: Option<Duration> },
	/// No response at all, surfaced as [`Error::Network`].
	NetworkFailure(String),
}

impl FakeReply {
	pub fn json(status: u16, body: Value) -> Self {
		Self::Respond { status, body, delay: None }
	}

	pub fn ok(body: Value) -> Self {
		Self::json(200, body)
	}

	pub fn network_failure(message: impl Into<String>) -> Self {
		Self::NetworkFailure(message.into())
	}

	/// Holds the reply back for `delay` before answering.
	pub fn delayed(self, delay: Duration) -> Self {
		match self {
			Self::Respond { status, body, .. } => Self::Respond {
				status,
				body,
				delay: Some(delay),
			},
			other => other,
		}
	}
}

/// One request as the fake backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
	pub method: Method,
	pub path: String,
	pub bearer: Option<String>,
	pub body: Option<Value>,
}

type Handler = Arc<dyn Fn(&ApiRequest, Option<&str>) -> FakeReply + Send + Sync>;

#[derive(Default)]
pub struct FakeDispatcher {
	queued: Mutex<HashMap<String, VecDeque<FakeReply>>>,
	routes: Mutex<HashMap<String, Handler>>,
	sent: Mutex<Vec<SentRequest>>,
}

impl FakeDispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a one-shot reply for `path`.
	pub fn enqueue(&self, path: &str, reply: FakeReply) -> &Self {
		self.queued.lock().entry(normalize(path)).or_default().push_back(reply);
		self
	}

	/// Queues a one-shot JSON reply for `path`.
	pub fn respond(&self, path: &str, status: u16, body: Value) -> &Self {
		self.enqueue(path, FakeReply::json(status, body))
	}

	/// Answers every request to `path` (once its queue is empty) with `handler`.
	pub fn route<F>(&self, path: &str, handler: F) -> &Self
	where
		F: Fn(&ApiRequest, Option<&str>) -> FakeReply + Send + Sync + 'static,
	{
		self.routes.lock().insert(normalize(path), Arc::new(handler));
		self
	}

	pub fn sent(&self) -> Vec<SentRequest> {
		self.sent.lock().clone()
	}

	pub fn sent_to(&self, path: &str) -> Vec<SentRequest> {
		let path = normalize(path);
		self.sent.lock().iter().filter(|r| r.path == path).cloned().collect()
	}

	pub fn count(&self, path: &str) -> usize {
		self.sent_to(path).len()
	}

	fn next_reply(&self, request: &ApiRequest, bearer: Option<&str>) -> FakeReply {
		let path = normalize(&request.path);
		if let Some(reply) = self.queued.lock().get_mut(&path).and_then(VecDeque::pop_front) {
			return reply;
		}
		let handler = self.routes.lock().get(&path).cloned();
		match handler {
			Some(handler) => handler(request, bearer),
			None => FakeReply::json(404, json!({ "detail": format!("no fake route for {path}") })),
		}
	}
}

#[async_trait]
impl Dispatch for FakeDispatcher {
	async fn dispatch(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse> {
		self.sent.lock().push(SentRequest {
			method: request.method.clone(),
			path: normalize(&request.path),
			bearer: bearer.map(str::to_string),
			body: request.body.clone(),
		});

		match self.next_reply(request, bearer) {
			FakeReply::NetworkFailure(message) => Err(Error::Network(message)),
			FakeReply::Respond { status, body, delay } => {
				if let Some(delay) = delay {
					tokio::time::sleep(delay).await;
				}
				let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
				let body = if body.is_null() { Vec::new() } else { serde_json::to_vec(&body)? };
				Ok(ApiResponse::new(status, body))
			}
		}
	}
}

fn normalize(path: &str) -> String {
	path.trim_start_matches('/').to_string()
}
