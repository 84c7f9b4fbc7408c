mod args;
mod command;
mod config;
mod console;
mod error;
mod pages;
mod paths;
mod print;

use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use registrar_lib::RegistrarClient;
use registrar_lib::auth::AccessToken;
use registrar_lib::auth::Session;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use crate::args::Cli;
use crate::config::ConsoleConfig;
use crate::console::Console;
use crate::error::ConsoleError;

/// Rotates old logs and sends this run's log to `latest.log`.
fn init_logging(verbose: bool) -> Result<(), ConsoleError> {
    paths::rotate_logs()?;
    let Some(path) = paths::log_file() else {
        return Ok(());
    };

    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    WriteLogger::init(level, Config::default(), File::create(&path)?)?;
    log::info!("Logging to {}", path.display());
    Ok(())
}

async fn run(cli: Cli) -> Result<(), ConsoleError> {
    let config = ConsoleConfig::resolve(&cli)?;
    log::debug!("Config: {:?}", config);

    let session = match &cli.token {
        Some(token) => Session::with_token(AccessToken::new(token.as_str())),
        None => Session::new(),
    };

    let client = RegistrarClient::builder()
        .url(config.server.url.as_str())
        .token_provider(session.clone())
        .timeout(config.timeout())
        .build();

    Console::new(client, session, config).run(cli.login).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
