//! Background task that renews the access token before it expires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::session::SessionManager;

/// Spawns periodic refresh tasks for a session.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
	session: Arc<SessionManager>,
	interval: Duration,
}

impl RefreshScheduler {
	/// Uses the interval from the session's [`ClientConfig`](crate::ClientConfig).
	pub fn new(session: Arc<SessionManager>) -> Self {
		let interval = session.config().refresh_interval;
		Self { session, interval }
	}

	/// Shorthand for `new(session).with_interval(interval).start()`.
	pub fn spawn(session: Arc<SessionManager>, interval: Duration) -> RefreshHandle {
		Self::new(session).with_interval(interval).start()
	}

	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval;
		self
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Starts refreshing every interval, first tick one interval from now.
	///
	/// The task ends by itself once the session is gone or a refresh fails;
	/// it never outlives the returned handle.
	pub fn start(&self) -> RefreshHandle {
		let (stop_tx, stop_rx) = oneshot::channel();
		let task = tokio::spawn(run(self.session.clone(), self.interval, stop_rx));
		debug!(target = "elimu.refresh", interval_secs = self.interval.as_secs(), "refresh scheduler started");
		RefreshHandle {
			stop: Some(stop_tx),
			task,
		}
	}
}

async fn run(session: Arc<SessionManager>, period: Duration, mut stop: oneshot::Receiver<()>) {
	let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
	ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			_ = &mut stop => {
				debug!(target = "elimu.refresh", "refresh scheduler cancelled");
				return;
			}
			_ = ticks.tick() => {}
		}

		if !session.is_authenticated() {
			debug!(target = "elimu.refresh", "no session; refresh scheduler stopping");
			return;
		}
		if session.refresh_token().await.is_none() {
			info!(target = "elimu.refresh", "scheduled refresh failed; session cleared");
			return;
		}
		debug!(target = "elimu.refresh", "scheduled refresh succeeded");
	}
}

/// Owner of a running refresh task. Dropping it stops the task.
#[derive(Debug)]
pub struct RefreshHandle {
	stop: Option<oneshot::Sender<()>>,
	task: JoinHandle<()>,
}

impl RefreshHandle {
	/// Stops the task and waits for it to wind down.
	pub async fn cancel(mut self) {
		if let Some(stop) = self.stop.take() {
			let _ = stop.send(());
		}
		let _ = (&mut self.task).await;
	}

	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}
}

impl Drop for RefreshHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}
