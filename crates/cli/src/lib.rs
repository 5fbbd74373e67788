//! `elimu` command-line client.
//!
//! Keeps an authenticated Elimu Space session in a JSON file and exposes the
//! session lifecycle and authenticated API calls as subcommands.

pub mod cli;
pub mod commands;
pub mod context;
pub mod logging;
pub mod output;
