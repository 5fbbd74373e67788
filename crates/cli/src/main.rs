use clap::Parser;
use elimu_cli::cli::Cli;
use elimu_cli::context::CliContext;
use elimu_cli::{commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let result = match CliContext::new(&cli) {
		Ok(ctx) => commands::dispatch(cli.command, &ctx).await,
		Err(err) => Err(err),
	};

	if let Err(err) = result {
		error!(target = "elimu", error = %format!("{err:#}"), "command failed");
		std::process::exit(1);
	}
}
