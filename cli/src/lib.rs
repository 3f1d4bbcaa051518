//! Terminal frontend for the items service.
//!
//! One-shot subcommands (`list`, `show`, `create`, `update`, `delete`) and
//! an interactive `shell` built on `items-core`, talking to the backend over
//! `reqwest`.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
pub mod shell;
pub mod transport;

use std::io;

use anyhow::Context;

pub use app::App;
pub use cli::{Cli, Command};
pub use commands::Outcome;
pub use config::{Config, ConfigError};
pub use transport::ReqwestTransport;

/// Resolve configuration and run the parsed command against stdin/stdout.
pub async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let config = Config::load(cli.base_url.as_deref()).context("invalid configuration")?;
    let app = App::from_config(&config);
    tracing::debug!(base_url = app.service().client().base_url(), "resolved configuration");

    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();
    commands::run(&app, cli.command, &mut input, &mut out).await
}
