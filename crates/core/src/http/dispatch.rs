use async_trait::async_trait;
use tracing::debug;

use super::request::{ApiRequest, ApiResponse};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Sends one request and returns whatever the server answered.
///
/// Implementations never interpret statuses; a non-2xx answer is still
/// `Ok`. Only a missing response (timeout, refused connection) is an error,
/// and it is always [`Error::Network`].
#[async_trait]
pub trait Dispatch: Send + Sync {
	async fn dispatch(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse>;
}

/// reqwest-backed dispatcher bound to the configured API base and timeout.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
	client: reqwest::Client,
	config: ClientConfig,
}

impl HttpDispatcher {
	pub fn new(config: &ClientConfig) -> Result<Self> {
		config.validate()?;
		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()
			.map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
		Ok(Self {
			client,
			config: config.clone(),
		})
	}
}

#[async_trait]
impl Dispatch for HttpDispatcher {
	async fn dispatch(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse> {
		let url = self.config.endpoint(&request.path)?;
		let mut builder = self.client.request(request.method.clone(), url.clone());
		if !request.query.is_empty() {
			builder = builder.query(&request.query);
		}
		if let Some(token) = bearer {
			builder = builder.bearer_auth(token);
		}
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder.send().await.map_err(|e| network_error(&self.config, e))?;
		let status = response.status();
		let body = response.bytes().await.map_err(|e| network_error(&self.config, e))?;

		debug!(
			target = "elimu.http",
			method = %request.method,
			%url,
			status = status.as_u16(),
			authenticated = bearer.is_some(),
			"request completed"
		);
		Ok(ApiResponse::new(status, body.to_vec()))
	}
}

fn network_error(config: &ClientConfig, err: reqwest::Error) -> Error {
	if err.is_timeout() {
		Error::Network(format!("request timed out after {}ms", config.timeout.as_millis()))
	} else if err.is_connect() {
		Error::Network(format!("connection failed: {err}"))
	} else {
		Error::Network(err.to_string())
	}
}
