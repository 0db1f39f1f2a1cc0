mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::process::ExitCode;
use stream_monitor::{Shutdown, StreamMonitor, ViewerClient};
use tracing::{error, info};

async fn run(cli: &Cli) -> Result<Shutdown> {
    let config = cli.resolve_config()?;
    let client = ViewerClient::new(config).context("Invalid configuration")?;

    let mut monitor = StreamMonitor::new(client.config().summary_interval);
    monitor.console().banner(&client.config().endpoint)?;

    let shutdown = client.run(&mut monitor).await?;
    info!(
        "Monitor stopped after {} frames",
        monitor.stats().frame_count()
    );
    Ok(shutdown)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::Version) => {
            println!("stream-monitor {}", stream_monitor::VERSION);
            return ExitCode::SUCCESS;
        }
        Some(Command::DumpConfig) => {
            let dumped = cli
                .resolve_config()
                .and_then(|config| toml::to_string_pretty(&config).context("Failed to serialize config"));
            return match dumped {
                Ok(text) => {
                    print!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    ExitCode::FAILURE
                }
            };
        }
        None => {}
    }

    if let Err(e) = cli::init_logging(&cli) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(shutdown) => {
            info!("Exiting: {:?}", shutdown);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Monitor failed: {:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
