use super::request::StatusCode;

/// What the pipeline does with a response for one attempt of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
	/// Hand the response (or its error) to the caller as final.
	Return,
	/// Refresh the session, then replay the same request exactly once.
	RefreshAndRetry,
}

/// Retry-once contract: only a first 401 triggers a refresh.
///
/// A 401 on the replayed attempt is final, so a revoked refresh token cannot
/// cause a refresh storm.
pub fn next_step(status: StatusCode, retried: bool) -> RetryStep {
	if status == StatusCode::UNAUTHORIZED && !retried {
		RetryStep::RefreshAndRetry
	} else {
		RetryStep::Return
	}
}
