//! Command-line interface and logging setup

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stream_monitor::MonitorConfig;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Stream monitor command-line interface
#[derive(Parser, Debug)]
#[command(name = "stream-monitor")]
#[command(about = "Join a WebSocket video stream as a viewer and report on every frame", long_about = None)]
#[command(version)]
pub struct Cli {
    /// WebSocket endpoint (e.g. ws://192.168.56.1:5000/video-stream)
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Configuration file (defaults to ~/.config/stream-monitor/monitor.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Frames between statistics summaries
    #[arg(short, long, value_name = "FRAMES")]
    pub summary_interval: Option<u64>,

    /// Type of the join request sent on connect
    #[arg(long, value_name = "TYPE")]
    pub join_type: Option<String>,

    /// Prefix of the client id sent with the join request
    #[arg(long, value_name = "PREFIX")]
    pub client_id_prefix: Option<String>,

    /// Handshake timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(short, long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Enable JSON structured logging
    #[arg(long)]
    pub json_logs: bool,

    /// Show timestamps in logs
    #[arg(long, default_value = "true")]
    pub timestamps: bool,

    /// Diagnostic subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Commands that do not open a connection
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show version information
    Version,

    /// Print the effective configuration as TOML
    DumpConfig,
}

impl Cli {
    /// Merge the configuration file with command-line overrides
    pub fn resolve_config(&self) -> Result<MonitorConfig> {
        let mut config = MonitorConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(interval) = self.summary_interval {
            config = config.with_summary_interval(interval);
        }
        if let Some(join_type) = &self.join_type {
            config = config.with_join_type(join_type.clone());
        }
        if let Some(prefix) = &self.client_id_prefix {
            config = config.with_client_id_prefix(prefix.clone());
        }
        if let Some(secs) = self.connect_timeout {
            config = config.with_connect_timeout(secs);
        }

        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }
}

/// Initialize logging based on CLI configuration
///
/// Logs go to stderr so they never interleave with the frame report on stdout.
pub fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = cli.log_level.parse::<Level>().with_context(|| {
        format!(
            "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
            cli.log_level
        )
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.as_str()))
        .context("Failed to create log filter")?;

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true);

    match (cli.json_logs, cli.timestamps) {
        (true, true) => subscriber.json().init(),
        (true, false) => subscriber.without_time().json().init(),
        (false, true) => subscriber.init(),
        (false, false) => subscriber.without_time().init(),
    }

    debug!(
        "Logging initialized: level={}, json={}, timestamps={}",
        log_level, cli.json_logs, cli.timestamps
    );

    Ok(())
}
