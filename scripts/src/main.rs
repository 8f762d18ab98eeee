use std::io;

use clap::Parser;
use scripts::{
    cli::Cli,
    config::{Environment, ToolchainConfig},
    errors::ScriptError,
};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    // Load `.env` before parsing so that it can supply CLI defaults
    let env = Environment::from_process();
    let (settings, command) = Cli::parse().into_parts();

    let config = ToolchainConfig::from_env(&env);
    command.run(&settings, &config).await
}
