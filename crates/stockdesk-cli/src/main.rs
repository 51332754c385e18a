mod cli;
mod commands;
mod error;
mod output;
mod watchlist;

use std::sync::Arc;

use clap::Parser;
use stockdesk_core::{
    with_session, AppConfig, ProviderFactory, ProviderStrategy, RateLimiter, ReqwestHttpClient,
};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_filter, cli.verbose);

    let strategy = match &cli.provider {
        Some(raw) => raw.parse::<ProviderStrategy>()?,
        None => config.strategy,
    };

    let factory = ProviderFactory::new(
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(RateLimiter::with_default_providers()),
    );
    let provider = factory.get_provider(strategy, config.polygon_api_key.as_deref())?;

    let command = &cli.command;
    let format = cli.format;
    with_session(provider.as_ref(), |provider| async move {
        commands::run(command, provider, format).await
    })
    .await
}

fn init_tracing(filter: &str, verbose: bool) {
    let directives = if verbose { "debug" } else { filter };
    let env_filter = tracing_subscriber::EnvFilter::try_new(directives)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
