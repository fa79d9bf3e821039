mod config;
mod logging;
mod statsd;

use clap::{Parser, Subcommand};
use config::Config;
use serde::Serialize;
use sheet_sync::controller::Controller;
use sheet_sync::envelope::Envelope;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "directomatic", version, about = "Publishes spreadsheet redirects to Cloudflare")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short, default_value = "directomatic.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Clone, Copy)]
enum CliCommand {
    /// Serve the HTTP API and the admin listener
    Serve,
    /// Check that the spreadsheet and the rules list are reachable
    Status,
    /// Show the rules the spreadsheet produces and the rows it rejects
    List,
    /// Compare the spreadsheet against the published rules list
    Diff,
    /// Replace the published rules list with the spreadsheet contents
    Publish,
}

#[derive(thiserror::Error, Debug)]
#[error("{0} did not succeed")]
struct CommandFailed(&'static str);

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    let _guard = logging::init(config.common.logging.as_ref())?;
    if let Some(metrics) = &config.common.metrics {
        statsd::init(metrics)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli.command, config.sync))
}

async fn run(command: CliCommand, config: sheet_sync::config::Config) -> Result<(), Box<dyn Error>> {
    if let CliCommand::Serve = command {
        tracing::info!(version = sheet_sync::VERSION, "Starting directomatic");
        sheet_sync::run(config).await?;
        return Ok(());
    }

    config.validate()?;
    let controller = Controller::from_config(&config);

    match command {
        CliCommand::Serve => Ok(()),
        CliCommand::Status => print_envelope("status", &controller.status().await),
        CliCommand::List => print_result("list", controller.list().await),
        CliCommand::Diff => print_result("diff", controller.diff().await),
        CliCommand::Publish => print_result("publish", controller.publish().await),
    }
}

fn print_result<T: Serialize, E: Error>(
    name: &'static str,
    result: Result<Envelope<T>, E>,
) -> Result<(), Box<dyn Error>> {
    match result {
        Ok(envelope) => print_envelope(name, &envelope),
        Err(e) => print_envelope(name, &Envelope::failure(e.to_string())),
    }
}

/// Prints the envelope as pretty JSON; fails unless it reports success.
fn print_envelope<T: Serialize>(name: &'static str, envelope: &Envelope<T>) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(envelope)?);

    match envelope.success {
        Some(true) => Ok(()),
        _ => Err(Box::new(CommandFailed(name))),
    }
}
