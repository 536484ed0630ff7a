pub mod auth;
pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod ready;
pub mod search;
pub mod ui;

pub use cli::{Cli, CliError};

/// Library entrypoint: dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    cli::run(cli).await
}
