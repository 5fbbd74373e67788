use anyhow::bail;
use elimu::{AuthContext, SessionState};
use tracing::info;

use crate::context::CliContext;

/// Mounts the auth context and keeps refreshing until ctrl-c or session loss.
pub async fn run(ctx: &CliContext) -> anyhow::Result<()> {
	let context = AuthContext::mount(ctx.session.clone(), ctx.config.refresh_interval);
	if !context.is_authenticated() {
		bail!("not signed in");
	}
	let mut states = context.subscribe();
	info!(target = "elimu", interval_secs = ctx.config.refresh_interval.as_secs(), "keeping session alive");
	eprintln!("Keeping the session fresh; press Ctrl-C to stop.");

	loop {
		tokio::select! {
			signal = tokio::signal::ctrl_c() => {
				signal?;
				context.unmount().await;
				return Ok(());
			}
			changed = states.changed() => {
				changed?;
				if *states.borrow_and_update() == SessionState::Unauthenticated {
					context.unmount().await;
					bail!("session ended; sign in again");
				}
			}
		}
	}
}
