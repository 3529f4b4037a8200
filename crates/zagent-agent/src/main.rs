use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use zagent_agent::agent::{Agent, RunOptions};
use zagent_agent::config::AgentConfig;
use zagent_common::command::SystemCommandRunner;

/// Collects gear metrics, logs them locally and sends them to Zabbix.
#[derive(Debug, Parser)]
#[command(name = "zagent", version, about)]
struct Cli {
    /// TOML config file; environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Echo the data being sent and pass -vv to the sender.
    #[arg(short, long)]
    verbose: bool,

    /// Collect and record without sending.
    #[arg(long)]
    no_send: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(status) => ExitCode::from(u8::try_from(status).unwrap_or(1)),
        Err(e) => {
            tracing::error!(error = %e, "zagent failed");
            eprintln!("zagent: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let level = if cli.verbose { "zagent=debug" } else { "zagent=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let mut config = match &cli.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    config.apply_os_env(std::env::vars_os())?;
    let settings = config.resolve()?;

    tracing::info!(
        host = %settings.host,
        transmit = settings.server.is_some(),
        "zagent starting"
    );

    let agent = Agent::new(&settings, Arc::new(SystemCommandRunner));
    let summary = agent.run(RunOptions {
        verbose: cli.verbose,
        skip_send: cli.no_send,
    });

    tracing::info!(
        metrics = summary.metrics,
        failed_sources = ?summary.failed_sources,
        recorded = summary.recorded,
        status = summary.status,
        "Run complete"
    );
    Ok(summary.status)
}
