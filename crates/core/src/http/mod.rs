//! HTTP pipeline: request description, dispatch, and the refresh-and-retry-once client.
//!
//! The pipeline is explicit instead of hooked into a global client:
//!
//! 1. [`ApiClient`] attaches the stored access token as a bearer credential.
//! 2. A [`Dispatch`] implementation sends the request ([`HttpDispatcher`] in
//!    production, [`FakeDispatcher`] in tests).
//! 3. [`next_step`] decides what a status means for this attempt: return it,
//!    or refresh the session and replay the request once.

mod client;
mod dispatch;
pub mod fake;
mod request;
mod retry;

pub use client::{ApiClient, LoginRedirect, TracingLoginRedirect};
pub use dispatch::{Dispatch, HttpDispatcher};
pub use fake::{FakeDispatcher, FakeReply, SentRequest};
pub use request::{ApiRequest, ApiResponse, Method, StatusCode};
pub use retry::{RetryStep, next_step};
