#![deny(clippy::all, clippy::pedantic)]

use postwire::{ApiError, BlogClient, config, infra::telemetry::TelemetryError};
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to render output: {0}")]
    Output(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("served a fallback: {0}")]
    Degraded(String),
}

/// Resolve settings for this invocation, install logging, build the client.
pub fn build_client_from_cli(cli: &Cli) -> Result<BlogClient, CliError> {
    let settings = config::load(cli.config_file.as_deref(), &cli.overrides)?;
    postwire::infra::telemetry::init(&settings.logging)?;
    Ok(BlogClient::from_settings(&settings)?)
}
