mod cli;
mod net;
mod output;

use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::net::apply;
use crate::net::config::{self, ConfigError, FileConfig};
use crate::net::interfaces::{self, InterfaceError};
use crate::net::process::{Netsh, NetshRunner};
use crate::net::status;
use crate::net::types::{DnsProvider, InterfaceConfig, OverallVerdict};

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Interfaces(#[from] InterfaceError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            output::error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    match cli.command {
        Command::Interfaces => {
            let adapters = interfaces::enumerate()?;
            output::print_interfaces(&adapters);
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let (_, config) = prepare(&cli.global)?;
            let report = status::inspect(&Netsh, &config.interface).await;
            output::status_report(&config.interface, &report);
            Ok(match report.overall() {
                OverallVerdict::FullyEncrypted => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            })
        }
        Command::Cloudflare => {
            let (_, config) = prepare(&cli.global)?;
            configure(&Netsh, &config, &DnsProvider::cloudflare()).await
        }
        Command::Google => {
            let (_, config) = prepare(&cli.global)?;
            configure(&Netsh, &config, &DnsProvider::google()).await
        }
        Command::Custom => {
            let (file, config) = prepare(&cli.global)?;
            let provider = config::custom_provider(&file)?;
            configure(&Netsh, &config, &provider).await
        }
    }
}

/// Load the config file, report where it came from, and merge in the CLI
/// flags. Modes that touch netsh all start here.
fn prepare(global: &GlobalOpts) -> Result<(FileConfig, InterfaceConfig), AppError> {
    let (file, source) = config::load(global.config.as_deref())?;
    if let Some(path) = &source {
        output::info(&format!("Loaded config from: {}", path.display()));
    }
    let config = config::resolve_interface(&file, global)?;
    Ok((file, config))
}

async fn configure<R: NetshRunner>(
    runner: &R,
    config: &InterfaceConfig,
    provider: &DnsProvider,
) -> Result<ExitCode, AppError> {
    output::apply_banner(&provider.name, &config.interface, config.dns_only);

    // A failed pipeline has already printed the stage and rolled back.
    if apply::apply_provider(runner, config, provider).await.is_err() {
        return Ok(ExitCode::FAILURE);
    }

    println!();
    output::success("Configuration complete!");
    println!();
    Ok(ExitCode::SUCCESS)
}
