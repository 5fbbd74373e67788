use anyhow::{Context, anyhow};
use elimu::ApiRequest;
use elimu::http::Method;

use crate::context::CliContext;
use crate::output::emit_body;

pub async fn run(ctx: &CliContext, method: &str, path: &str, data: Option<&str>) -> anyhow::Result<()> {
	let method = parse_method(method)?;
	let mut request = ApiRequest::new(method, path);
	if let Some(data) = data {
		let body: serde_json::Value = serde_json::from_str(data).context("--data must be valid JSON")?;
		request = request.with_body(body);
	}

	let response = ctx.client().send(request).await?;
	emit_body(response.body());
	Ok(())
}

fn parse_method(raw: &str) -> anyhow::Result<Method> {
	let method = Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|_| anyhow!("invalid HTTP method '{raw}'"))?;
	match method {
		Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE => Ok(method),
		other => Err(anyhow!("unsupported HTTP method '{other}'")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn methods_are_case_insensitive() {
		assert_eq!(parse_method("get").unwrap(), Method::GET);
		assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
	}

	#[test]
	fn unsupported_methods_are_rejected() {
		assert!(parse_method("TRACE").is_err());
		assert!(parse_method("not a method").is_err());
	}
}
